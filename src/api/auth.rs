use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AuthRequest, AuthResponse};
use crate::services::AuthError;

/// Identity resolved from the bearer token, available to downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInitData | AuthError::MissingTelegramUser => {
                Self::validation(err.to_string())
            }
            AuthError::InvalidToken(_) => Self::unauthorized("Invalid token"),
            AuthError::Forbidden => Self::forbidden("Admin access required"),
            AuthError::UserNotFound => Self::user_not_found(),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>` and attaches [`AuthenticatedUser`]
/// to both the request and the response.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    let user = AuthenticatedUser {
        user_id: state.auth_service().verify_token(&token)?,
    };
    request.extensions_mut().insert(user.clone());

    // Copied onto the response for the request log
    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Runs after [`auth_middleware`]; rejects tokens of non-admin users.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.auth_service().require_admin(&user.user_id).await?;
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

/// Client IP from the request body, else from proxy headers.
fn client_ip(body_ip: Option<String>, headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = body_ip.filter(|ip| !ip.trim().is_empty()) {
        return Some(ip);
    }

    if let Some(forwarded) = headers.get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next().map(str::trim)
        && !first.is_empty()
    {
        return Some(first.to_string());
    }

    headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(ToString::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// Logs in with Telegram init-data.
///
/// # Endpoint
/// `POST /api/auth`
///
/// Creates the account on first login, crediting the referrer named by
/// `start_param`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let ip_address = client_ip(payload.ip_address, &headers);

    let result = state
        .auth_service()
        .login(&payload.init_data, ip_address)
        .await?;

    if result.created {
        tracing::info!(user_id = %result.user.id, "New user registered");
    }

    Ok(Json(ApiResponse::success(AuthResponse {
        token: result.token,
        user: result.user.into(),
    })))
}
