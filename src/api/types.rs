use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::services::Statistics;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub special_id: String,
    pub referrer_id: Option<String>,
    pub referrals: i32,
    pub stars: i32,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_cheater: bool,
    pub is_bot: bool,
    pub is_blocked: bool,
    pub is_premium: bool,
    pub joined_channel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub created_at: String,
    pub last_active: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            telegram_id: user.telegram_id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            photo_url: user.photo_url,
            special_id: user.special_id,
            referrer_id: user.referrer_id,
            referrals: user.referrals,
            stars: user.stars,
            is_verified: user.is_verified,
            is_admin: user.is_admin,
            is_cheater: user.is_cheater,
            is_bot: user.is_bot,
            is_blocked: user.is_blocked,
            is_premium: user.is_premium,
            joined_channel: user.joined_channel,
            ip_address: user.ip_address,
            created_at: user.created_at,
            last_active: user.last_active,
        }
    }
}

/// Public view of an account someone referred.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReferredUserDto {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub special_id: String,
    pub stars: i32,
    pub is_premium: bool,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<User> for ReferredUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            photo_url: user.photo_url,
            special_id: user.special_id,
            stars: user.stars,
            is_premium: user.is_premium,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(default)]
    pub init_data: String,
    pub ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserDto,
    pub referred_users: Vec<ReferredUserDto>,
    pub referral_link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChannelResponse {
    pub joined_channel: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub statistics: Statistics,
    pub latest_users: Vec<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct PaginationDto {
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionRequest {
    pub user_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserActionResponse {
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct BulkActionRequest {
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkActionResponse {
    pub count: u64,
}

/// Raw values so that strings or fractions surface as 400 instead of a
/// JSON rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusConfigRequest {
    pub referral_bonus: Option<serde_json::Value>,
    pub premium_referral_bonus: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub uptime_seconds: u64,
}
