use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::models::{NewProfile, Photo, Profile};
use crate::schema::{photos, profiles};
use crate::services::profile_service::{self, PhotoSlot, ProfileInput, ProfileWithPhotos};
use crate::AppState;

fn profile_missing() -> AppError {
    AppError::new(ErrorCode::ProfileNotFound, "profile not found")
}

// --- GET /api/profile ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileWithPhotos>>> {
    let mut conn = state.db.get()?;

    let profile = profile_service::find_by_user(&mut conn, user.id)?.ok_or_else(profile_missing)?;
    let view = profile_service::with_photos(&mut conn, &profile)?;

    Ok(Json(ApiResponse::ok(view)))
}

// --- POST /api/profile ---

pub async fn create_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProfileWithPhotos>>)> {
    input.validate().map_err(super::invalid)?;

    let mut conn = state.db.get()?;

    if profile_service::find_by_user(&mut conn, user.id)?.is_some() {
        return Err(AppError::new(ErrorCode::ProfileAlreadyExists, "profile already exists"));
    }

    let profile: Profile = diesel::insert_into(profiles::table)
        .values(&NewProfile { user_id: user.id, fields: input.into_fields() })
        .get_result(&mut conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::new(ErrorCode::ProfileAlreadyExists, "profile already exists")
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, profile_id = %profile.id, "profile created");

    let view = profile_service::with_photos(&mut conn, &profile)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

// --- PUT /api/profile ---

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<ApiResponse<ProfileWithPhotos>>> {
    input.validate().map_err(super::invalid)?;

    let mut conn = state.db.get()?;

    let now = Utc::now();
    let profile: Profile = diesel::update(profiles::table.filter(profiles::user_id.eq(user.id)))
        .set((
            &input.into_fields(),
            profiles::updated_at.eq(now),
            profiles::last_active.eq(now),
        ))
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(profile_missing)?;

    tracing::info!(user_id = %user.id, "profile updated");

    let view = profile_service::with_photos(&mut conn, &profile)?;
    Ok(Json(ApiResponse::ok(view)))
}

// --- PUT /api/profile/photos ---

#[derive(Debug, Deserialize)]
pub struct ReplacePhotosRequest {
    pub photos: Vec<PhotoSlot>,
}

pub async fn replace_photos(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReplacePhotosRequest>,
) -> AppResult<Json<ApiResponse<Vec<Photo>>>> {
    let mut conn = state.db.get()?;

    let profile = profile_service::find_by_user(&mut conn, user.id)?.ok_or_else(profile_missing)?;
    let arranged = profile_service::arrange_photos(profile.id, req.photos);

    let (mut saved, previous) = conn.transaction::<_, DieselError, _>(|conn| {
        let previous: Vec<String> = diesel::delete(photos::table.filter(photos::profile_id.eq(profile.id)))
            .returning(photos::url)
            .get_results(conn)?;
        if arranged.is_empty() {
            return Ok((Vec::new(), previous));
        }
        let saved = diesel::insert_into(photos::table)
            .values(&arranged)
            .get_results::<Photo>(conn)?;
        Ok((saved, previous))
    })?;
    drop(conn);
    saved.sort_by_key(|p| p.position);

    tracing::info!(user_id = %user.id, count = saved.len(), "profile photos replaced");

    // Uploads dropped from the set are removed from storage.
    let dropped: Vec<String> = previous
        .iter()
        .filter(|url| !saved.iter().any(|p| &p.url == *url))
        .filter_map(|url| state.minio.key_for_url(url).map(str::to_string))
        .collect();
    for key in dropped {
        if let Err(e) = state.minio.delete(&key).await {
            tracing::warn!(error = %e, key = %key, "failed to delete dropped photo");
        }
    }

    Ok(Json(ApiResponse::ok(saved)))
}
