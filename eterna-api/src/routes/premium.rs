use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use eterna_shared::errors::AppResult;
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::services::premium::{self, Plan, PLANS};
use crate::services::quota;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PremiumStatus {
    pub is_premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
    /// `None` for premium accounts, or when the counter cannot be read.
    pub likes_remaining: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: String,
}

/// GET /api/premium/plans
pub async fn list_plans() -> Json<ApiResponse<&'static [Plan]>> {
    Json(ApiResponse::ok(&PLANS[..]))
}

/// GET /api/premium/status
pub async fn status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<PremiumStatus>>> {
    let account = {
        let mut conn = state.db.get()?;
        super::load_user(&mut conn, user.id)?
    };

    let is_premium = account.is_premium_at(Utc::now());
    let likes_remaining = if is_premium {
        None
    } else {
        quota::likes_remaining(&state.redis, user.id, state.config.free_daily_likes).await
    };

    Ok(Json(ApiResponse::ok(PremiumStatus {
        is_premium,
        premium_until: account.premium_until,
        likes_remaining,
    })))
}

/// POST /api/premium/subscribe
///
/// Grants the plan immediately; there is no payment step.
pub async fn subscribe(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<PremiumStatus>>> {
    let plan = premium::paid_plan(&req.plan_id)?;
    let mut conn = state.db.get()?;

    let now = Utc::now();
    let current = super::load_user(&mut conn, user.id)?;
    let until = premium::extend_premium(current.premium_until, plan, now);

    let updated: User = diesel::update(users::table.find(user.id))
        .set((users::premium_until.eq(Some(until)), users::updated_at.eq(now)))
        .get_result(&mut conn)?;

    metrics::counter!("eterna_premium_subscriptions_total", "plan" => plan.id).increment(1);
    tracing::info!(user_id = %user.id, plan = plan.id, premium_until = %until, "premium subscription extended");

    Ok(Json(ApiResponse::ok(PremiumStatus {
        is_premium: true,
        premium_until: updated.premium_until,
        likes_remaining: None,
    })))
}
