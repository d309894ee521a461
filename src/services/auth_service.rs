//! Domain service for Telegram login and session tokens.

use thiserror::Error;

use crate::models::user::User;
use crate::services::token::TokenError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid data")]
    InvalidInitData,

    #[error("User data not found")]
    MissingTelegramUser,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Forbidden")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
    /// `true` when this login created the account
    pub created: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Validates init-data, creates or refreshes the user and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidInitData`] if the signature does not match and
    /// [`AuthError::MissingTelegramUser`] if the payload carries no user.
    async fn login(
        &self,
        init_data: &str,
        ip_address: Option<String>,
    ) -> Result<LoginResult, AuthError>;

    /// Verifies a session token and returns the user id it carries.
    fn verify_token(&self, token: &str) -> Result<String, AuthError>;

    /// Mints a token for an existing user id.
    fn issue_token(&self, user_id: &str) -> Result<String, AuthError>;

    /// Loads the user behind a token and checks the admin flag.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] for unknown or non-admin users.
    async fn require_admin(&self, user_id: &str) -> Result<User, AuthError>;
}
