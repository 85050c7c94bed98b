use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use eterna_shared::errors::AppResult;
use eterna_shared::middleware::AdminUser;
use eterna_shared::types::{Ack, ApiResponse, Paginated, PaginationParams};

use crate::models::{Report, User};
use crate::schema::{likes, matches, messages, reports, users};
use crate::services::analytics::{self, Analytics, AnalyticsRange};
use crate::services::moderation::{self, ReportAction, UserAction};
use crate::services::profile_service::{self, ProfileCard};
use crate::services::settings::{self, SystemSettings};
use crate::AppState;

const USER_LIST_LIMIT: i64 = 100;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 50 }

impl ReportFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams { page: self.page, per_page: self.per_page }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub range: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct UserStats {
    pub likes_sent: i64,
    pub likes_received: i64,
    pub matches: i64,
    pub messages_sent: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: User,
    pub is_premium: bool,
    pub profile: Option<ProfileCard>,
    pub stats: UserStats,
}

#[derive(Debug, Clone, Serialize, Queryable)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminReportView {
    #[serde(flatten)]
    pub report: Report,
    pub sender: Option<UserSummary>,
    pub target: Option<UserSummary>,
}

/// Per-user row counts for one grouping column.
fn counts_by(rows: Vec<(Uuid, i64)>) -> HashMap<Uuid, i64> {
    rows.into_iter().collect()
}

// --- GET /api/admin/users ---

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<AdminUserView>>>> {
    let mut conn = state.db.get()?;

    let accounts: Vec<User> = users::table
        .order(users::created_at.desc())
        .limit(USER_LIST_LIMIT)
        .load(&mut conn)?;
    let ids: Vec<Uuid> = accounts.iter().map(|u| u.id).collect();

    let mut cards = profile_service::cards_for_users(&mut conn, &ids)?;

    let likes_sent = counts_by(
        likes::table
            .filter(likes::sender_id.eq_any(&ids))
            .filter(likes::is_like.eq(true))
            .group_by(likes::sender_id)
            .select((likes::sender_id, count_star()))
            .load(&mut conn)?,
    );
    let likes_received = counts_by(
        likes::table
            .filter(likes::receiver_id.eq_any(&ids))
            .filter(likes::is_like.eq(true))
            .group_by(likes::receiver_id)
            .select((likes::receiver_id, count_star()))
            .load(&mut conn)?,
    );
    let match_counts = counts_by(
        matches::table
            .filter(matches::user_id.eq_any(&ids))
            .filter(matches::is_active.eq(true))
            .group_by(matches::user_id)
            .select((matches::user_id, count_star()))
            .load(&mut conn)?,
    );
    let messages_sent = counts_by(
        messages::table
            .filter(messages::sender_id.eq_any(&ids))
            .group_by(messages::sender_id)
            .select((messages::sender_id, count_star()))
            .load(&mut conn)?,
    );

    let now = Utc::now();
    let views = accounts
        .into_iter()
        .map(|user| {
            let id = user.id;
            AdminUserView {
                is_premium: user.is_premium_at(now),
                profile: cards.remove(&id),
                stats: UserStats {
                    likes_sent: likes_sent.get(&id).copied().unwrap_or(0),
                    likes_received: likes_received.get(&id).copied().unwrap_or(0),
                    matches: match_counts.get(&id).copied().unwrap_or(0),
                    messages_sent: messages_sent.get(&id).copied().unwrap_or(0),
                },
                user,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

// --- PATCH /api/admin/users/:id ---

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ActionRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let action: UserAction = body.action.parse()?;
    let mut conn = state.db.get()?;

    moderation::apply_user_action(&mut conn, user_id, action)?;

    tracing::info!(
        admin_id = %admin.0.id,
        user_id = %user_id,
        action = %body.action,
        "admin user action applied"
    );

    Ok(Json(ApiResponse::ok_with_message(
        Ack { updated: 1 },
        format!("user action '{}' applied", body.action),
    )))
}

// --- GET /api/admin/reports ---

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<ReportFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<AdminReportView>>>> {
    let mut conn = state.db.get()?;

    let pagination = params.pagination();

    let mut items_query = reports::table.order(reports::created_at.desc()).into_boxed();
    let mut total_query = reports::table.count().into_boxed();
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        items_query = items_query.filter(reports::status.eq(status.to_string()));
        total_query = total_query.filter(reports::status.eq(status.to_string()));
    }

    let items: Vec<Report> = items_query
        .offset(pagination.offset() as i64)
        .limit(pagination.limit() as i64)
        .load(&mut conn)?;
    let total: i64 = total_query.get_result(&mut conn)?;

    let people: Vec<Uuid> = items.iter().flat_map(|r| [r.sender_id, r.target_id]).collect();
    let summaries: HashMap<Uuid, UserSummary> = users::table
        .filter(users::id.eq_any(&people))
        .select((users::id, users::email, users::name))
        .load::<UserSummary>(&mut conn)?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let views = items
        .into_iter()
        .map(|report| AdminReportView {
            sender: summaries.get(&report.sender_id).cloned(),
            target: summaries.get(&report.target_id).cloned(),
            report,
        })
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(views, total as u64, &pagination))))
}

// --- PATCH /api/admin/reports/:id ---

pub async fn update_report(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(report_id): Path<Uuid>,
    Json(body): Json<ActionRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let action: ReportAction = body.action.parse()?;
    let mut conn = state.db.get()?;

    let report = moderation::apply_report_action(&mut conn, report_id, action)?;

    tracing::info!(
        admin_id = %admin.0.id,
        report_id = %report_id,
        status = %report.status,
        "report updated"
    );

    Ok(Json(ApiResponse::ok(report)))
}

// --- Settings ---

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Json<ApiResponse<SystemSettings>> {
    Json(ApiResponse::ok(state.settings.snapshot()))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(patch): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<SystemSettings>>> {
    let updated = state.settings.snapshot().merged(&patch)?;

    let mut conn = state.db.get()?;
    settings::save(&mut conn, &updated)?;
    state.settings.replace(updated.clone());

    tracing::info!(
        admin_id = %admin.0.id,
        maintenance_mode = updated.maintenance_mode,
        enable_notifications = updated.enable_notifications,
        "system settings updated"
    );

    Ok(Json(ApiResponse::ok_with_message(updated, "settings updated")))
}

// --- GET /api/admin/analytics ---

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<AnalyticsParams>,
) -> AppResult<Json<ApiResponse<Analytics>>> {
    let range = AnalyticsRange::parse(params.range.as_deref());
    let mut conn = state.db.get()?;
    let report = analytics::compute(&mut conn, range, Utc::now())?;
    Ok(Json(ApiResponse::ok(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_filter_defaults() {
        let params: ReportFilterParams = serde_json::from_value(serde_json::json!({})).unwrap();
        let pagination = params.pagination();
        assert_eq!(pagination.limit(), 50);
        assert_eq!(pagination.offset(), 0);
        assert!(params.status.is_none());
    }

    #[test]
    fn user_view_flattens_account_without_hash() {
        let now = Utc::now();
        let view = AdminUserView {
            user: User {
                id: Uuid::nil(),
                email: "a@b.co".into(),
                name: None,
                password_hash: "secret".into(),
                role: "user".into(),
                verified: false,
                is_banned: false,
                premium_until: None,
                created_at: now,
                updated_at: now,
            },
            is_premium: false,
            profile: None,
            stats: UserStats { likes_sent: 2, ..Default::default() },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["email"], "a@b.co");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["stats"]["likes_sent"], 2);
    }
}
