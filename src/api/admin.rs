//! Admin API endpoints.
//!
//! Every route here sits behind the bearer and admin middleware. Business
//! logic lives in [`AdminService`](crate::services::AdminService).

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    normalize_search, require_field, validate_bonus, validate_limit, validate_page,
};
use super::{
    ApiError, ApiResponse, AppState, BonusConfigRequest, BulkActionRequest, BulkActionResponse,
    PaginationDto, StatsResponse, UserActionRequest, UserActionResponse, UsersResponse,
};
use crate::models::user::UserFilter;
use crate::services::{AdminError, ReferralBonuses, UserListQuery};

/// Query parameters for the user list.
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub filter: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Validation(msg) => Self::validation(msg),
            AdminError::UserNotFound(id) => Self::not_found("User", id),
            AdminError::Database(msg) => Self::DatabaseError(msg),
            AdminError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Returns user counts and the newest accounts.
///
/// # Endpoint
/// `GET /api/admin/stats`
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let stats = state.admin_service().stats().await?;

    Ok(Json(ApiResponse::success(StatsResponse {
        statistics: stats.statistics,
        latest_users: stats.latest_users.into_iter().map(Into::into).collect(),
    })))
}

/// Lists users, newest first.
///
/// # Endpoint
/// `GET /api/admin/users`
///
/// # Query Parameters
/// - `page`: 1-based page (default: 1)
/// - `limit`: page size, 1 to 100 (default: 20)
/// - `search`: matches names, username, Telegram id and special id
/// - `filter`: `premium`, `verified`, `blocked`, `cheaters`, `bots` or `honest`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<ApiResponse<UsersResponse>>, ApiError> {
    let query = UserListQuery {
        page: validate_page(query.page)?,
        limit: validate_limit(query.limit)?,
        search: normalize_search(query.search.as_deref()),
        filter: query
            .filter
            .as_deref()
            .map(UserFilter::parse)
            .unwrap_or_default(),
    };

    let list = state.admin_service().list_users(query).await?;

    Ok(Json(ApiResponse::success(UsersResponse {
        users: list.users.into_iter().map(Into::into).collect(),
        pagination: PaginationDto {
            total: list.total,
            pages: list.pages,
            page: list.page,
            limit: list.limit,
        },
    })))
}

/// Applies a moderation action to one user.
///
/// # Endpoint
/// `POST /api/admin/user-action`
///
/// # Errors
/// 400 for missing fields or unknown actions, 404 for unknown users.
pub async fn user_action(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserActionRequest>,
) -> Result<Json<ApiResponse<UserActionResponse>>, ApiError> {
    const MISSING: &str = "User ID and action are required";
    let user_id = require_field(payload.user_id.as_deref(), MISSING)?;
    let action = require_field(payload.action.as_deref(), MISSING)?;

    let user = state.admin_service().user_action(user_id, action).await?;

    Ok(Json(ApiResponse::success(UserActionResponse {
        user: user.into(),
    })))
}

/// `POST /api/admin/bulk-action`
pub async fn bulk_action(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkActionRequest>,
) -> Result<Json<ApiResponse<BulkActionResponse>>, ApiError> {
    let action = require_field(payload.action.as_deref(), "Action is required")?;
    let count = state.admin_service().bulk_action(action).await?;

    Ok(Json(ApiResponse::success(BulkActionResponse { count })))
}

/// `GET /api/admin/config`
pub async fn get_config(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ReferralBonuses>> {
    Json(ApiResponse::success(
        state.admin_service().referral_bonuses().await,
    ))
}

/// Updates the referral bonuses held in memory.
///
/// # Endpoint
/// `POST /api/admin/config`
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BonusConfigRequest>,
) -> Result<Json<ApiResponse<ReferralBonuses>>, ApiError> {
    let bonuses = ReferralBonuses {
        referral_bonus: validate_bonus("referralBonus", payload.referral_bonus.as_ref())?,
        premium_referral_bonus: validate_bonus(
            "premiumReferralBonus",
            payload.premium_referral_bonus.as_ref(),
        )?,
    };

    let updated = state
        .admin_service()
        .update_referral_bonuses(bonuses)
        .await?;

    Ok(Json(ApiResponse::success(updated)))
}
