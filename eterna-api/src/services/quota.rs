use chrono::{DateTime, Timelike, Utc};
use uuid::Uuid;

use eterna_shared::clients::redis::RedisClient;
use eterna_shared::errors::{AppError, AppResult, ErrorCode};

const DAY_SECS: u64 = 24 * 3600;
const HOUR_SECS: u64 = 3600;

/// Per-user like counter for the current UTC day.
pub fn like_key(user_id: Uuid, now: DateTime<Utc>) -> String {
    format!("quota:likes:{user_id}:{}", now.format("%Y%m%d"))
}

/// Per-user message counter for the current UTC hour.
pub fn message_key(user_id: Uuid, now: DateTime<Utc>) -> String {
    format!("quota:messages:{user_id}:{}{:02}", now.format("%Y%m%d"), now.hour())
}

/// Likes still available today for a free account.
pub async fn likes_remaining(redis: &RedisClient, user_id: Uuid, limit: u64) -> Option<u64> {
    match redis.counter(&like_key(user_id, Utc::now())).await {
        Ok(used) => Some(limit.saturating_sub(used)),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user_id, "like quota unavailable");
            None
        }
    }
}

/// Rejects the like once today's allowance is used up. An unreadable counter
/// lets the like through.
pub fn check_like_allowance(remaining: Option<u64>, limit: u64) -> AppResult<()> {
    match remaining {
        Some(0) => Err(AppError::new(
            ErrorCode::LikeQuotaExceeded,
            format!("free accounts can send {limit} likes per day"),
        )),
        _ => Ok(()),
    }
}

pub async fn ensure_like_available(redis: &RedisClient, user_id: Uuid, limit: u64) -> AppResult<()> {
    check_like_allowance(likes_remaining(redis, user_id, limit).await, limit)
}

/// Counts a like that has already been stored.
pub async fn record_like(redis: &RedisClient, user_id: Uuid) {
    if let Err(e) = redis.bump(&like_key(user_id, Utc::now()), DAY_SECS).await {
        tracing::warn!(error = %e, user_id = %user_id, "like quota not recorded");
    }
}

pub async fn consume_message(redis: &RedisClient, user_id: Uuid, limit: u64) -> AppResult<()> {
    let key = message_key(user_id, Utc::now());
    match redis.rate_limit_check(&key, limit, HOUR_SECS).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::new(
            ErrorCode::MessageRateLimited,
            "message limit reached, try again later",
        )),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user_id, "message quota check failed, allowing");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn like_key_rolls_over_at_utc_midnight() {
        let user = Uuid::now_v7();
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert_ne!(like_key(user, late), like_key(user, early));
        assert!(like_key(user, late).ends_with(":20250601"));
    }

    #[test]
    fn message_key_is_hourly() {
        let user = Uuid::now_v7();
        let a = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 6, 1, 9, 59, 0).unwrap();
        let c = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(message_key(user, a), message_key(user, b));
        assert_ne!(message_key(user, b), message_key(user, c));
        assert!(message_key(user, a).ends_with(":2025060109"));
    }

    #[test]
    fn exhausted_allowance_rejects_like() {
        let err = check_like_allowance(Some(0), 10).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LikeQuotaExceeded);
        assert!(check_like_allowance(Some(1), 10).is_ok());
    }

    #[test]
    fn unreadable_counter_allows_like() {
        assert!(check_like_allowance(None, 10).is_ok());
    }
}
