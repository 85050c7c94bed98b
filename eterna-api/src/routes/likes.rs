use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::models::Like;
use crate::schema::{likes, users};
use crate::services::matching::{self, SwipeResult};
use crate::services::profile_service::{self, ProfileCard};
use crate::services::quota;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendLikeRequest {
    pub target_id: Uuid,
    #[serde(default = "default_is_like")]
    pub is_like: bool,
}

fn default_is_like() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ReceivedLike {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sender: Option<ProfileCard>,
    pub main_photo: Option<String>,
}

/// POST /api/likes
pub async fn send_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendLikeRequest>,
) -> AppResult<Json<ApiResponse<SwipeResult>>> {
    if req.target_id == user.id {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "cannot like yourself"));
    }

    let notifications_enabled = state.settings.snapshot().enable_notifications;

    let is_premium = {
        let mut conn = state.db.get()?;

        let target_exists: bool = diesel::select(diesel::dsl::exists(users::table.find(req.target_id)))
            .get_result(&mut conn)?;
        if !target_exists {
            return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
        }

        if matching::already_responded(&mut conn, user.id, req.target_id)? {
            return Err(AppError::new(ErrorCode::AlreadyResponded, "already responded to this profile"));
        }

        super::load_user(&mut conn, user.id)?.is_premium_at(Utc::now())
    };

    let counts_against_quota = req.is_like && !is_premium;
    if counts_against_quota {
        quota::ensure_like_available(&state.redis, user.id, state.config.free_daily_likes).await?;
    }

    let mut conn = state.db.get()?;
    let outcome = matching::record_swipe(
        &mut conn,
        user.id,
        req.target_id,
        req.is_like,
        notifications_enabled,
    )?;

    if counts_against_quota {
        quota::record_like(&state.redis, user.id).await;
    }

    metrics::counter!("eterna_swipes_total", "like" => req.is_like.to_string()).increment(1);
    tracing::info!(
        user_id = %user.id,
        target_id = %req.target_id,
        is_like = req.is_like,
        outcome = ?outcome,
        "swipe recorded"
    );

    Ok(Json(ApiResponse::ok(outcome.into())))
}

/// GET /api/likes
pub async fn received_likes(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ReceivedLike>>>> {
    let mut conn = state.db.get()?;

    if !super::load_user(&mut conn, user.id)?.is_premium_at(Utc::now()) {
        return Err(AppError::new(ErrorCode::PremiumRequired, "seeing who liked you requires premium"));
    }

    let received: Vec<Like> = likes::table
        .filter(likes::receiver_id.eq(user.id))
        .filter(likes::is_like.eq(true))
        .order(likes::created_at.desc())
        .load(&mut conn)?;

    let sender_ids: Vec<Uuid> = received.iter().map(|l| l.sender_id).collect();
    let mut cards = profile_service::cards_for_users(&mut conn, &sender_ids)?;

    let items = received
        .into_iter()
        .map(|like| {
            let sender = cards.remove(&like.sender_id);
            let main_photo = sender
                .as_ref()
                .and_then(|c| profile_service::main_photo(&c.photos))
                .map(|p| p.url.clone());
            ReceivedLike {
                id: like.id,
                sender_id: like.sender_id,
                created_at: like.created_at,
                sender,
                main_photo,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}
