use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, Claims, UserRole};

const DEV_SECRET: &str = "development-secret-change-in-production";

/// Secret shared by token issuance and the extractors. `main` exports the
/// configured value into `JWT_SECRET` before serving.
pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = validate_jwt(&token, &jwt_secret())?;

        if claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

pub fn issue_jwt(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
    })?;

    Ok(token_data.claims)
}

/// Require Admin role
#[derive(Debug)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::new(ErrorCode::Forbidden, "admin access required"));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn token_round_trip() {
        let claims = Claims::new(Uuid::now_v7(), UserRole::Admin, 60);
        let token = issue_jwt(&claims, "secret-a").unwrap();
        let decoded = validate_jwt(&token, "secret-a").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, UserRole::Admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::now_v7(), UserRole::User, 60);
        let token = issue_jwt(&claims, "secret-a").unwrap();
        let err = validate_jwt(&token, "secret-b").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let claims = Claims::new(Uuid::now_v7(), UserRole::User, -3600);
        let token = issue_jwt(&claims, "secret-a").unwrap();
        let err = validate_jwt(&token, "secret-a").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenExpired);
    }

    #[test]
    fn bearer_scheme_required() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Basic abc".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let claims = Claims::new(Uuid::now_v7(), UserRole::User, 60);
        let token = issue_jwt(&claims, &jwt_secret()).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AdminUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn admin_passes() {
        let claims = Claims::new(Uuid::now_v7(), UserRole::Admin, 60);
        let token = issue_jwt(&claims, &jwt_secret()).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, claims.sub);
    }
}
