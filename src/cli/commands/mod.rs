mod check_admin;
mod check_referrals;
mod issue_token;

pub use check_admin::cmd_check_admin;
pub use check_referrals::cmd_check_referrals;
pub use issue_token::cmd_issue_token;

use crate::models::user::User;

fn print_user(user: &User) {
    println!("{} (@{})", user.first_name, user.username.as_deref().unwrap_or("-"));
    println!(
        "  ID: {} | Telegram: {} | Special ID: {}",
        user.id, user.telegram_id, user.special_id
    );
    println!(
        "  Referrals: {} | Stars: {} | Admin: {} | Verified: {}",
        user.referrals, user.stars, user.is_admin, user.is_verified
    );
    if user.is_cheater || user.is_bot || user.is_blocked {
        println!(
            "  Cheater: {} | Bot: {} | Blocked: {}",
            user.is_cheater, user.is_bot, user.is_blocked
        );
    }
}
