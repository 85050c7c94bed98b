use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use eterna_shared::errors::{AppError, ErrorCode};
use eterna_shared::middleware::issue_jwt;
use eterna_shared::types::auth::{AccessToken, Claims, UserRole};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one number"));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one letter"));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signs a bearer token for `user_id` valid for `ttl_secs`.
pub fn access_token(user_id: Uuid, role: UserRole, secret: &str, ttl_secs: i64) -> Result<AccessToken, AppError> {
    let claims = Claims::new(user_id, role, ttl_secs);
    let token = issue_jwt(&claims, secret)?;
    Ok(AccessToken::new(token, ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eterna_shared::middleware::validate_jwt;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hunter42x").unwrap();
        assert!(verify_password("hunter42x", &hash).unwrap());
        assert!(!verify_password("hunter43x", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        assert!(verify_password("whatever1", "not-a-phc-string").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short1").is_err());
        assert!(validate_password("longenough").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("letters123").is_ok());
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alex@Example.COM "), "alex@example.com");
    }

    #[test]
    fn issued_token_carries_role() {
        let user = Uuid::now_v7();
        let token = access_token(user, UserRole::Moderator, "s3cret", 120).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 120);
        let claims = validate_jwt(&token.access_token, "s3cret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, UserRole::Moderator);
    }
}
