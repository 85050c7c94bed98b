use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::{Ack, ApiResponse};

use crate::models::{NewPushSubscription, PushSubscription};
use crate::schema::push_subscriptions;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subscription: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PushConfig {
    pub enabled: bool,
    pub vapid_public_key: Option<String>,
}

/// Trimmed endpoint; subscribe and unsubscribe must agree on the stored form.
fn normalize_endpoint(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string)
}

/// Endpoint of a browser push subscription object.
fn subscription_endpoint(subscription: Option<&Value>) -> AppResult<String> {
    normalize_endpoint(subscription.and_then(|s| s.get("endpoint")).and_then(Value::as_str))
        .ok_or_else(|| AppError::new(ErrorCode::InvalidSubscription, "invalid subscription"))
}

/// POST /api/push/subscribe
pub async fn subscribe(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<PushSubscription>>> {
    let endpoint = subscription_endpoint(req.subscription.as_ref())?;
    let subscription_data = req.subscription.unwrap_or(Value::Null);

    let mut conn = state.db.get()?;

    let saved: PushSubscription = diesel::insert_into(push_subscriptions::table)
        .values(&NewPushSubscription { user_id: user.id, endpoint, subscription_data })
        .on_conflict((push_subscriptions::user_id, push_subscriptions::endpoint))
        .do_update()
        .set((
            push_subscriptions::subscription_data.eq(excluded(push_subscriptions::subscription_data)),
            push_subscriptions::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    tracing::info!(user_id = %user.id, subscription_id = %saved.id, "push subscription saved");

    Ok(Json(ApiResponse::ok(saved)))
}

/// POST /api/push/unsubscribe
pub async fn unsubscribe(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnsubscribeRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let endpoint = normalize_endpoint(req.endpoint.as_deref())
        .ok_or_else(|| AppError::new(ErrorCode::InvalidSubscription, "endpoint is required"))?;

    let mut conn = state.db.get()?;

    let removed = diesel::delete(
        push_subscriptions::table
            .filter(push_subscriptions::user_id.eq(user.id))
            .filter(push_subscriptions::endpoint.eq(&endpoint)),
    )
    .execute(&mut conn)?;

    tracing::info!(user_id = %user.id, removed, "push subscription removed");

    Ok(Json(ApiResponse::ack(removed)))
}

/// GET /api/push/config
pub async fn push_config(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<PushConfig>> {
    Json(ApiResponse::ok(PushConfig {
        enabled: state.settings.snapshot().enable_push_notifications,
        vapid_public_key: state.config.vapid_public_key.clone(),
    }))
}
