use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::{Ack, ApiResponse, Paginated, PaginationParams};

use crate::models::{NewNotification, Notification};
use crate::services::notification_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "type is required"))]
    pub notification_type: String,
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// GET /api/notifications
pub async fn list_notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    let mut conn = state.db.get()?;

    let (items, total) = notification_service::list(
        &mut conn,
        user.id,
        params.limit() as i64,
        params.offset() as i64,
    )?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let mut conn = state.db.get()?;
    let count = notification_service::count_unread(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(UnreadCount { count })))
}

/// POST /api/notifications
///
/// With notifications switched off nothing is stored and `data` is null.
pub async fn create_notification(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Option<Notification>>>)> {
    req.validate().map_err(super::invalid)?;

    let enabled = state.settings.snapshot().enable_notifications;
    let mut conn = state.db.get()?;

    let created = notification_service::create(
        &mut conn,
        enabled,
        &NewNotification {
            user_id: user.id,
            notification_type: req.notification_type,
            title: req.title,
            message: req.message,
            data: req.data,
        },
    )?;

    let response = match created {
        Some(n) => ApiResponse::ok(Some(n)),
        None => ApiResponse::ok_with_message(None, "notifications are disabled"),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let mut conn = state.db.get()?;
    let updated = notification_service::mark_all_read(&mut conn, user.id)?;
    tracing::debug!(user_id = %user.id, updated, "notifications marked read");
    Ok(Json(ApiResponse::ack(updated)))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let mut conn = state.db.get()?;
    let notification = notification_service::mark_read(&mut conn, user.id, id)?
        .ok_or_else(|| AppError::new(ErrorCode::NotificationNotFound, "notification not found"))?;
    Ok(Json(ApiResponse::ok(notification)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_reads_type_key() {
        let req: CreateNotificationRequest = serde_json::from_value(json!({
            "type": "system",
            "title": "Welcome",
            "message": "Thanks for joining",
        }))
        .unwrap();
        assert_eq!(req.notification_type, "system");
        assert!(req.data.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_title_is_rejected() {
        let req = CreateNotificationRequest {
            notification_type: "system".into(),
            title: String::new(),
            message: "hi".into(),
            data: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }
}
