use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile and photo errors
/// - E3xxx: Likes and matching errors
/// - E4xxx: Messaging errors
/// - E5xxx: Notification and push errors
/// - E6xxx: Moderation errors
/// - E7xxx: Premium errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    MethodNotAllowed,
    Maintenance,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    PasswordTooWeak,
    UserBanned,
    UserNotFound,

    // Profile (E2xxx)
    ProfileNotFound,
    ProfileAlreadyExists,
    ProfileIncomplete,
    PhotoUploadFailed,
    InvalidPhoto,

    // Matching (E3xxx)
    CannotLikeSelf,
    AlreadyResponded,
    MatchNotFound,

    // Messaging (E4xxx)
    MessageRateLimited,
    InvalidMessage,

    // Notification (E5xxx)
    NotificationNotFound,
    InvalidSubscription,

    // Moderation (E6xxx)
    ReportNotFound,
    CannotReportSelf,
    DuplicateReport,
    InvalidAction,

    // Premium (E7xxx)
    PremiumRequired,
    LikeQuotaExceeded,
    PlanNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0008",
            Self::MethodNotAllowed => "E0010",
            Self::Maintenance => "E0011",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::PasswordTooWeak => "E1005",
            Self::UserBanned => "E1006",
            Self::UserNotFound => "E1007",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::ProfileAlreadyExists => "E2002",
            Self::ProfileIncomplete => "E2003",
            Self::PhotoUploadFailed => "E2004",
            Self::InvalidPhoto => "E2005",

            // Matching
            Self::CannotLikeSelf => "E3001",
            Self::AlreadyResponded => "E3002",
            Self::MatchNotFound => "E3003",

            // Messaging
            Self::MessageRateLimited => "E4001",
            Self::InvalidMessage => "E4002",

            // Notification
            Self::NotificationNotFound => "E5001",
            Self::InvalidSubscription => "E5002",

            // Moderation
            Self::ReportNotFound => "E6001",
            Self::CannotReportSelf => "E6002",
            Self::DuplicateReport => "E6003",
            Self::InvalidAction => "E6004",

            // Premium
            Self::PremiumRequired => "E7001",
            Self::LikeQuotaExceeded => "E7002",
            Self::PlanNotFound => "E7003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::PhotoUploadFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::ProfileAlreadyExists | Self::ProfileIncomplete | Self::InvalidPhoto
            | Self::CannotLikeSelf | Self::AlreadyResponded | Self::InvalidMessage
            | Self::InvalidSubscription | Self::InvalidAction => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound | Self::UserNotFound | Self::ProfileNotFound | Self::MatchNotFound
            | Self::NotificationNotFound | Self::ReportNotFound | Self::PlanNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::UserBanned | Self::CannotReportSelf
            | Self::PremiumRequired => StatusCode::FORBIDDEN,
            Self::MessageRateLimited | Self::LikeQuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailAlreadyExists | Self::DuplicateReport => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The code this error will be reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

/// Pool checkout failures surface as internal errors.
impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        tracing::error!(error = %err, "failed to get db connection");
        AppError::internal("database connection error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn known_error_shape() {
        let value = body_json(AppError::new(ErrorCode::MatchNotFound, "match not found")).await;

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "E3003");
        assert_eq!(value["error"]["message"], "match not found");
        assert!(value["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn details_are_forwarded() {
        let err = AppError::with_details(
            ErrorCode::ValidationError,
            "invalid input",
            serde_json::json!({ "age": ["range"] }),
        );
        let value = body_json(err).await;
        assert_eq!(value["error"]["details"]["age"][0], "range");
    }

    #[tokio::test]
    async fn diesel_not_found_is_404() {
        let response = AppError::Database(diesel::result::Error::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let value = body_json(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(value["error"]["message"], "internal server error");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AlreadyResponded.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::PremiumRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::LikeQuotaExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::Maintenance.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::DuplicateReport.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn codes_are_unique() {
        let all = [
            ErrorCode::InternalError, ErrorCode::ValidationError, ErrorCode::NotFound,
            ErrorCode::Unauthorized, ErrorCode::Forbidden, ErrorCode::BadRequest,
            ErrorCode::MethodNotAllowed, ErrorCode::Maintenance, ErrorCode::InvalidCredentials,
            ErrorCode::EmailAlreadyExists, ErrorCode::TokenExpired, ErrorCode::TokenInvalid,
            ErrorCode::PasswordTooWeak, ErrorCode::UserBanned, ErrorCode::UserNotFound,
            ErrorCode::ProfileNotFound, ErrorCode::ProfileAlreadyExists, ErrorCode::ProfileIncomplete,
            ErrorCode::PhotoUploadFailed, ErrorCode::InvalidPhoto, ErrorCode::CannotLikeSelf,
            ErrorCode::AlreadyResponded, ErrorCode::MatchNotFound, ErrorCode::MessageRateLimited,
            ErrorCode::InvalidMessage, ErrorCode::NotificationNotFound, ErrorCode::InvalidSubscription,
            ErrorCode::ReportNotFound, ErrorCode::CannotReportSelf, ErrorCode::DuplicateReport,
            ErrorCode::InvalidAction, ErrorCode::PremiumRequired, ErrorCode::LikeQuotaExceeded,
            ErrorCode::PlanNotFound,
        ];
        let mut codes: Vec<&str> = all.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
