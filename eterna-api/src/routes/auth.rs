use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};
use eterna_shared::types::auth::{AccessToken, AuthUser, UserRole};
use eterna_shared::types::ApiResponse;

use crate::models::{NewUser, User};
use crate::schema::users;
use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub verified: bool,
    pub is_premium: bool,
    pub premium_until: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AccessToken>>)> {
    req.validate().map_err(super::invalid)?;
    auth_service::validate_password(&req.password)?;

    let new_user = NewUser {
        email: auth_service::normalize_email(&req.email),
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        password_hash: auth_service::hash_password(&req.password)?,
    };

    let mut conn = state.db.get()?;

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::new(ErrorCode::EmailAlreadyExists, "email already registered")
            }
            other => other.into(),
        })?;

    let token = auth_service::access_token(
        user.id,
        UserRole::User,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(token))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    let mut conn = state.db.get()?;

    let user: User = users::table
        .filter(users::email.eq(auth_service::normalize_email(&req.email)))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    if !auth_service::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    if user.is_banned {
        tracing::warn!(user_id = %user.id, "banned user attempted login");
        return Err(AppError::new(ErrorCode::UserBanned, "account banned"));
    }

    let role = user.role.parse::<UserRole>().unwrap_or(UserRole::User);
    let token = auth_service::access_token(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(token)))
}

/// GET /api/auth/me
pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.db.get()?;

    let account = users::table
        .find(user.id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let now = chrono::Utc::now();
    Ok(Json(ApiResponse::ok(MeResponse {
        id: account.id,
        is_premium: account.is_premium_at(now),
        email: account.email,
        name: account.name,
        role: account.role,
        verified: account.verified,
        premium_until: account.premium_until,
        created_at: account.created_at,
    })))
}
