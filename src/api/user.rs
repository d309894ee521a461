//! Endpoints for the signed-in user.

use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::AuthenticatedUser;
use super::{ApiError, ApiResponse, AppState, JoinChannelResponse, ProfileResponse};
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::user_not_found(),
            UserError::Blocked => Self::forbidden(err.to_string()),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Returns the profile, referred users and referral link.
///
/// # Endpoint
/// `GET /api/user`
///
/// # Errors
/// 404 for unknown users, 403 for blocked accounts.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let profile = state.user_service().get_profile(&auth.user_id).await?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: profile.user.into(),
        referred_users: profile.referred_users.into_iter().map(Into::into).collect(),
        referral_link: profile.referral_link,
    })))
}

/// `POST /api/join-channel`
pub async fn join_channel(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<JoinChannelResponse>>, ApiError> {
    let user = state.user_service().join_channel(&auth.user_id).await?;

    Ok(Json(ApiResponse::success(JoinChannelResponse {
        joined_channel: user.joined_channel,
    })))
}
