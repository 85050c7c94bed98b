use std::str::FromStr;

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewReport, Report};
use crate::schema::{profiles, reports, users};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_REVIEWED: &str = "reviewed";
pub const STATUS_RESOLVED: &str = "resolved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Hide,
    Show,
    Ban,
    Verify,
    Delete,
}

impl FromStr for UserAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide" => Ok(Self::Hide),
            "show" => Ok(Self::Show),
            "ban" => Ok(Self::Ban),
            "verify" => Ok(Self::Verify),
            "delete" => Ok(Self::Delete),
            other => Err(AppError::new(ErrorCode::InvalidAction, format!("invalid action: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Review,
    Resolve,
    Dismiss,
}

impl ReportAction {
    pub fn status(self) -> &'static str {
        match self {
            Self::Review => STATUS_REVIEWED,
            Self::Resolve | Self::Dismiss => STATUS_RESOLVED,
        }
    }
}

impl FromStr for ReportAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(Self::Review),
            "resolve" => Ok(Self::Resolve),
            "dismiss" => Ok(Self::Dismiss),
            other => Err(AppError::new(ErrorCode::InvalidAction, format!("invalid action: {other}"))),
        }
    }
}

/// Applies an admin action to a user. Profile visibility actions need the
/// user to have a profile.
pub fn apply_user_action(conn: &mut PgConnection, user_id: Uuid, action: UserAction) -> AppResult<()> {
    let not_found = || AppError::new(ErrorCode::UserNotFound, "user not found");

    let affected = match action {
        UserAction::Hide | UserAction::Show => {
            let affected = diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
                .set((
                    profiles::is_visible.eq(action == UserAction::Show),
                    profiles::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            if affected == 0 {
                return Err(AppError::new(ErrorCode::ProfileNotFound, "user has no profile"));
            }
            affected
        }
        UserAction::Ban => diesel::update(users::table.find(user_id))
            .set((
                users::is_banned.eq(true),
                users::verified.eq(false),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?,
        UserAction::Verify => diesel::update(users::table.find(user_id))
            .set((users::verified.eq(true), users::updated_at.eq(Utc::now())))
            .execute(conn)?,
        UserAction::Delete => diesel::delete(users::table.find(user_id)).execute(conn)?,
    };

    if affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

pub fn create_report(conn: &mut PgConnection, report: &NewReport) -> AppResult<Report> {
    if report.sender_id == report.target_id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "cannot report yourself"));
    }

    let target_exists: bool = diesel::select(diesel::dsl::exists(users::table.find(report.target_id)))
        .get_result(conn)?;
    if !target_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    let pending: i64 = reports::table
        .filter(reports::sender_id.eq(report.sender_id))
        .filter(reports::target_id.eq(report.target_id))
        .filter(reports::status.eq(STATUS_PENDING))
        .count()
        .get_result(conn)?;
    if pending > 0 {
        return Err(AppError::new(
            ErrorCode::DuplicateReport,
            "you already have a pending report for this user",
        ));
    }

    Ok(diesel::insert_into(reports::table)
        .values(report)
        .get_result::<Report>(conn)?)
}

pub fn apply_report_action(conn: &mut PgConnection, report_id: Uuid, action: ReportAction) -> AppResult<Report> {
    diesel::update(reports::table.find(report_id))
        .set((reports::status.eq(action.status()), reports::updated_at.eq(Utc::now())))
        .get_result::<Report>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_actions_parse() {
        assert_eq!("ban".parse::<UserAction>().unwrap(), UserAction::Ban);
        assert_eq!("verify".parse::<UserAction>().unwrap(), UserAction::Verify);
        let err = "promote".parse::<UserAction>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAction);
    }

    #[test]
    fn report_actions_map_to_statuses() {
        assert_eq!("review".parse::<ReportAction>().unwrap().status(), STATUS_REVIEWED);
        assert_eq!("resolve".parse::<ReportAction>().unwrap().status(), STATUS_RESOLVED);
        assert_eq!("dismiss".parse::<ReportAction>().unwrap().status(), STATUS_RESOLVED);
        assert!("escalate".parse::<ReportAction>().is_err());
    }
}
