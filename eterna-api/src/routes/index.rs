use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use eterna_shared::errors::{AppError, ErrorCode};
use eterna_shared::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct ApiIndex {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
}

const ENDPOINTS: &[(&str, &str)] = &[
    ("POST", "/api/auth/register"),
    ("POST", "/api/auth/login"),
    ("GET", "/api/auth/me"),
    ("GET", "/api/profile"),
    ("POST", "/api/profile"),
    ("PUT", "/api/profile"),
    ("PUT", "/api/profile/photos"),
    ("POST", "/api/photos/upload"),
    ("GET", "/api/discover"),
    ("GET", "/api/likes"),
    ("POST", "/api/likes"),
    ("GET", "/api/matches"),
    ("GET", "/api/matches/:id"),
    ("DELETE", "/api/matches/:id"),
    ("GET", "/api/messages/:match_id"),
    ("POST", "/api/messages/:match_id"),
    ("POST", "/api/messages/:match_id/read"),
    ("GET", "/api/notifications"),
    ("POST", "/api/notifications"),
    ("GET", "/api/notifications/unread-count"),
    ("POST", "/api/notifications/read-all"),
    ("POST", "/api/notifications/:id/read"),
    ("POST", "/api/push/subscribe"),
    ("POST", "/api/push/unsubscribe"),
    ("GET", "/api/push/config"),
    ("POST", "/api/reports"),
    ("GET", "/api/premium/plans"),
    ("GET", "/api/premium/status"),
    ("POST", "/api/premium/subscribe"),
    ("GET", "/api/admin/users"),
    ("PATCH", "/api/admin/users/:id"),
    ("GET", "/api/admin/reports"),
    ("PATCH", "/api/admin/reports/:id"),
    ("GET", "/api/admin/settings"),
    ("PATCH", "/api/admin/settings"),
    ("GET", "/api/admin/analytics"),
];

/// `/api` index. Stateless so it can sit on any router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api", get(api_index).fallback(method_not_allowed))
}

/// GET /api
pub async fn api_index() -> Json<ApiResponse<ApiIndex>> {
    Json(ApiResponse::ok(ApiIndex {
        name: "Eterna API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path)| Endpoint { method, path })
            .collect(),
    }))
}

pub async fn method_not_allowed() -> AppError {
    AppError::new(ErrorCode::MethodNotAllowed, "method not allowed")
}
