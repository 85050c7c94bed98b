use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::{Ack, ApiResponse};

use crate::models::{Match, Message};
use crate::schema::matches;
use crate::services::profile_service::{self, ProfileCard};
use crate::services::{chat, matching};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub target: Option<ProfileCard>,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MatchDetail {
    pub id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub other_user_id: Uuid,
    pub other_user: Option<ProfileCard>,
}

/// GET /api/matches
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MatchSummary>>>> {
    let mut conn = state.db.get()?;

    let own: Vec<Match> = matches::table
        .filter(matches::user_id.eq(user.id))
        .filter(matches::is_active.eq(true))
        .order(matches::created_at.desc())
        .load(&mut conn)?;

    let target_ids: Vec<Uuid> = own.iter().map(|m| m.target_id).collect();
    let mut cards = profile_service::cards_for_users(&mut conn, &target_ids)?;

    // Mirror row ids, so each conversation covers both sides of the pair.
    let mirrors: Vec<(Uuid, Uuid)> = matches::table
        .filter(matches::target_id.eq(user.id))
        .filter(matches::user_id.eq_any(&target_ids))
        .select((matches::user_id, matches::id))
        .load(&mut conn)?;

    let mut summaries = Vec::with_capacity(own.len());
    for m in own {
        let mut pair_ids = vec![m.id];
        pair_ids.extend(mirrors.iter().filter(|(other, _)| *other == m.target_id).map(|(_, id)| *id));

        summaries.push(MatchSummary {
            last_message: chat::last_message(&mut conn, &pair_ids)?,
            unread_count: chat::unread_count(&mut conn, &pair_ids, user.id)?,
            target: cards.remove(&m.target_id),
            id: m.id,
            user_id: m.user_id,
            target_id: m.target_id,
            created_at: m.created_at,
        });
    }

    Ok(Json(ApiResponse::ok(summaries)))
}

/// GET /api/matches/:id
pub async fn get_match(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MatchDetail>>> {
    let mut conn = state.db.get()?;

    let (found, _) = matching::resolve_pair(&mut conn, match_id, user.id)?;
    let other_user_id = found.other_side(user.id);
    let other_user = profile_service::cards_for_users(&mut conn, &[other_user_id])?.remove(&other_user_id);

    Ok(Json(ApiResponse::ok(MatchDetail {
        id: found.id,
        is_active: found.is_active,
        created_at: found.created_at,
        other_user_id,
        other_user,
    })))
}

/// DELETE /api/matches/:id
pub async fn unmatch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let mut conn = state.db.get()?;

    let (found, pair_ids) = matching::resolve_pair(&mut conn, match_id, user.id)?;
    if !found.is_active {
        return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
    }
    let updated = matching::unmatch(&mut conn, &pair_ids)?;

    tracing::info!(user_id = %user.id, match_id = %match_id, "unmatched");

    Ok(Json(ApiResponse::ack(updated)))
}
