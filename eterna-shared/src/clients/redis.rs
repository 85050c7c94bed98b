use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "connected to Redis");
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await.map(|_| ())
    }

    /// Current value of a counter key, zero when absent.
    pub async fn counter(&self, key: &str) -> Result<u64, redis::RedisError> {
        let mut conn = self.conn.clone();
        let value: Option<u64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    /// Increment a windowed counter; the TTL is set when the window opens.
    pub async fn bump(&self, key: &str, window_secs: u64) -> Result<u64, redis::RedisError> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.incr(key, 1u64).await?;
        if count == 1 {
            conn.expire::<_, ()>(key, window_secs as i64).await?;
        }
        Ok(count)
    }

    /// Counts this call against the window and reports whether it is still
    /// within `limit`.
    pub async fn rate_limit_check(
        &self,
        key: &str,
        limit: u64,
        window_secs: u64,
    ) -> Result<bool, redis::RedisError> {
        let count = self.bump(key, window_secs).await?;
        Ok(count <= limit)
    }
}
