use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::{Ack, ApiResponse};

use crate::models::{Message, NewMessage};
use crate::services::{chat, matching, quota};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub message_ids: Vec<Uuid>,
}

/// GET /api/messages/:match_id
pub async fn list_messages(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Message>>>> {
    let mut conn = state.db.get()?;

    let (_, pair_ids) = matching::resolve_pair(&mut conn, match_id, user.id)?;
    let messages = chat::conversation(&mut conn, &pair_ids)?;

    Ok(Json(ApiResponse::ok(messages)))
}

/// POST /api/messages/:match_id
pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let content = chat::validate_content(&req.content)?;
    let settings = state.settings.snapshot();

    let receiver_id = {
        let mut conn = state.db.get()?;
        let (found, _) = matching::resolve_pair(&mut conn, match_id, user.id)?;
        if !found.is_active {
            return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
        }
        found.other_side(user.id)
    };

    quota::consume_message(&state.redis, user.id, u64::from(settings.max_messages_per_hour)).await?;

    let mut conn = state.db.get()?;
    let message = chat::send_with_notification(
        &mut conn,
        &NewMessage { match_id, sender_id: user.id, receiver_id, content },
        settings.enable_notifications,
    )?;

    metrics::counter!("eterna_messages_sent_total").increment(1);
    tracing::info!(user_id = %user.id, match_id = %match_id, message_id = %message.id, "message sent");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

/// POST /api/messages/:match_id/read
pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let mut conn = state.db.get()?;

    let (_, pair_ids) = matching::resolve_pair(&mut conn, match_id, user.id)?;
    let updated = chat::mark_read(&mut conn, &pair_ids, user.id, &req.message_ids)?;

    tracing::debug!(user_id = %user.id, match_id = %match_id, updated, "messages marked read");

    Ok(Json(ApiResponse::ack(updated)))
}
