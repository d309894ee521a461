use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

use crate::api::{AppState, AuthenticatedUser};

/// `GET /api/admin/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Part of the API a request hit. Used as a metrics label instead of the raw
/// path, which an outer layer sees before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Auth,
    Health,
    User,
    Admin,
    Unknown,
}

impl Surface {
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let Some(rest) = path.strip_prefix("/api/") else {
            return Self::Unknown;
        };

        match rest.trim_end_matches('/') {
            "auth" => Self::Auth,
            "health" => Self::Health,
            "user" | "join-channel" => Self::User,
            admin if admin.starts_with("admin/") => Self::Admin,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Health => "health",
            Self::User => "user",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

/// Outermost layer: one span and one `http_request_finished` event per request.
///
/// The user id comes from the [`AuthenticatedUser`] that `auth_middleware`
/// copies onto the response, so it is recorded on this span regardless of
/// which inner layers were active.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let surface = Surface::from_path(&path);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        surface = surface.as_str(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let elapsed = start.elapsed();

        let user_id = response
            .extensions()
            .get::<AuthenticatedUser>()
            .map(|user| user.user_id.clone());
        if let Some(user_id) = &user_id {
            Span::current().record("user_id", user_id.as_str());
        }

        let labels = [
            ("method", method.to_string()),
            ("surface", surface.as_str().to_string()),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            metrics::counter!(
                "auth_rejections_total",
                "surface" => surface.as_str(),
                "status" => status.as_u16().to_string()
            )
            .increment(1);
        }

        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            status_code = status.as_u16(),
            user_id = user_id.as_deref(),
            authenticated = user_id.is_some(),
            outcome = outcome(status),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}
