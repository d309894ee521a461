//! Domain service for the signed-in user's own account.

use serde::Serialize;
use thiserror::Error;

use crate::models::user::User;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Account is blocked")]
    Blocked,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The user together with the accounts they brought in.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub referred_users: Vec<User>,
    pub referral_link: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Loads the profile and marks the user active.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Blocked`] for blocked accounts.
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, UserError>;

    /// Records that the user joined the announcement channel.
    async fn join_channel(&self, user_id: &str) -> Result<User, UserError>;
}
