use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::schema::profiles;
use crate::services::discovery::{self, DiscoverQuery, DiscoveryFilter};
use crate::services::profile_service::{self, ProfileCard};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub profiles: Vec<ProfileCard>,
    pub has_more: bool,
}

/// GET /api/discover
pub async fn discover(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> AppResult<Json<ApiResponse<DiscoverResponse>>> {
    let filter = DiscoveryFilter::try_from(query)?;
    let verified_only = state.settings.snapshot().require_profile_verification;

    let mut conn = state.db.get()?;

    let own = profile_service::find_by_user(&mut conn, user.id)?.ok_or_else(|| {
        AppError::new(ErrorCode::ProfileIncomplete, "please complete your profile first")
    })?;

    diesel::update(profiles::table.find(own.id))
        .set(profiles::last_active.eq(Utc::now()))
        .execute(&mut conn)?;

    let rows = discovery::find_candidates(&mut conn, user.id, &filter, verified_only)?;

    let profile_ids: Vec<_> = rows.iter().map(|(p, _)| p.id).collect();
    let mut photos = profile_service::photos_by_profile(&mut conn, &profile_ids)?;

    let mut cards: Vec<ProfileCard> = rows
        .into_iter()
        .map(|(profile, name)| {
            let photos = photos.remove(&profile.id).unwrap_or_default();
            profile_service::card(&profile, name, photos)
        })
        .collect();

    let has_more = discovery::shuffle_page(&mut cards, &mut rand::thread_rng());

    tracing::debug!(user_id = %user.id, returned = cards.len(), "discovery page served");

    Ok(Json(ApiResponse::ok(DiscoverResponse { profiles: cards, has_more })))
}
