use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use eterna_shared::errors::AppResult;
use eterna_shared::types::auth::AuthUser;
use eterna_shared::types::ApiResponse;

use crate::models::{NewReport, Report};
use crate::services::moderation;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub target_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "reason is required"))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub details: Option<String>,
}

/// POST /api/reports
pub async fn create_report(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Report>>)> {
    req.validate().map_err(super::invalid)?;

    let mut conn = state.db.get()?;

    let report = moderation::create_report(
        &mut conn,
        &NewReport {
            sender_id: user.id,
            target_id: req.target_id,
            reason: req.reason.trim().to_string(),
            details: req.details.filter(|d| !d.trim().is_empty()),
        },
    )?;

    tracing::info!(
        report_id = %report.id,
        sender_id = %user.id,
        target_id = %report.target_id,
        reason = %report.reason,
        "report created"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(report))))
}
