pub mod telegram;
pub mod user;
