pub mod admin;
pub mod auth;
pub mod discover;
pub mod health;
pub mod index;
pub mod likes;
pub mod matches;
pub mod messages;
pub mod notifications;
pub mod photos;
pub mod premium;
pub mod profile;
pub mod push;
pub mod reports;

use diesel::prelude::*;
use uuid::Uuid;
use validator::ValidationErrors;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::User;
use crate::schema::users;

/// 400 carrying the per-field validator report as details.
pub(crate) fn invalid(errors: ValidationErrors) -> AppError {
    let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
    AppError::with_details(ErrorCode::ValidationError, "invalid input", details)
}

pub(crate) fn load_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    users::table
        .find(user_id)
        .first::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}
