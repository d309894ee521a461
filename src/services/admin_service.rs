//! Domain service for moderation and reporting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::user::{User, UserFilter};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_users: u64,
    pub verified_users: u64,
    pub premium_users: u64,
    pub blocked_users: u64,
    pub cheaters: u64,
    pub bots: u64,
    /// Seen within the last 24 hours
    pub active_users: u64,
    /// Neither cheater nor bot
    pub honest_users: u64,
}

#[derive(Debug, Clone)]
pub struct AdminStats {
    pub statistics: Statistics,
    pub latest_users: Vec<User>,
}

#[derive(Debug, Clone)]
pub struct UserListQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub filter: UserFilter,
}

#[derive(Debug, Clone)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub limit: u64,
}

/// Runtime-adjustable referral rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralBonuses {
    pub referral_bonus: i32,
    pub premium_referral_bonus: i32,
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    async fn stats(&self) -> Result<AdminStats, AdminError>;

    async fn list_users(&self, query: UserListQuery) -> Result<UserList, AdminError>;

    /// Applies a single-user moderation action by name.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] for unknown actions and
    /// [`AdminError::UserNotFound`] for unknown ids.
    async fn user_action(&self, user_id: &str, action: &str) -> Result<User, AdminError>;

    /// Applies a bulk action by name and returns the affected count.
    async fn bulk_action(&self, action: &str) -> Result<u64, AdminError>;

    async fn referral_bonuses(&self) -> ReferralBonuses;

    async fn update_referral_bonuses(
        &self,
        bonuses: ReferralBonuses,
    ) -> Result<ReferralBonuses, AdminError>;
}
