use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::services::photos;
use crate::AppState;

const FIELD_NAME: &str = "photo";

#[derive(Debug, Serialize)]
pub struct UploadedPhoto {
    pub id: Uuid,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// POST /api/photos/upload
///
/// Stores the image and returns its URL; attaching it to the profile is a
/// separate `PUT /api/profile/photos`.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedPhoto>>> {
    let field = loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|e| AppError::new(ErrorCode::InvalidPhoto, format!("failed to read multipart: {e}")))?;
        match next {
            Some(field) if field.name() == Some(FIELD_NAME) => break field,
            Some(_) => continue,
            None => return Err(AppError::new(ErrorCode::InvalidPhoto, "no file uploaded")),
        }
    };

    let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
    let file_name = field.file_name().map(str::to_string);

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::InvalidPhoto, format!("failed to read file data: {e}")))?;

    let ext = photos::accept_upload(&content_type, file_name.as_deref(), data.len())?;

    let id = Uuid::new_v4();
    let key = photos::object_key(user.id, id, ext);

    let url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "photo upload failed");
            AppError::new(ErrorCode::PhotoUploadFailed, "photo upload failed")
        })?;

    tracing::info!(user_id = %user.id, key = %key, size = data.len(), "photo uploaded");

    Ok(Json(ApiResponse::ok(UploadedPhoto { id, url, uploaded_at: Utc::now() })))
}
