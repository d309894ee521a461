use serde::{Deserialize, Serialize};

/// The `user` object embedded in WebApp init-data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

/// Parsed WebApp launch payload. Only the fields the portal uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    pub query_id: Option<String>,
    pub user: Option<TelegramUser>,
    pub auth_date: Option<i64>,
    pub hash: Option<String>,
    /// Referral code carried by `startapp` links
    pub start_param: Option<String>,
}
