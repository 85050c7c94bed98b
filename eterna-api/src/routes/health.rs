use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use eterna_shared::{HealthCheck, HealthResponse};

use crate::AppState;

/// GET /health
///
/// The database is required; Redis only backs quotas, so losing it degrades
/// the service rather than failing it.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.db.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck::healthy("database"),
            Err(e) => HealthCheck::unhealthy("database", e.to_string()),
        },
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let redis = match state.redis.ping().await {
        Ok(()) => HealthCheck::healthy("redis"),
        Err(e) => HealthCheck::degraded("redis", e.to_string()),
    };

    let response = HealthResponse::healthy("eterna-api", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database, redis]);

    (response.status_code(), Json(response)).into_response()
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
