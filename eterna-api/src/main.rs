use std::sync::Arc;

use eterna_api::config::AppConfig;
use eterna_api::services::settings::{self, SettingsStore};
use eterna_api::{app, AppState};
use eterna_shared::clients::db::create_pool;
use eterna_shared::clients::minio::MinioClient;
use eterna_shared::clients::redis::RedisClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eterna_shared::middleware::init_tracing("eterna-api");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the signing secret from the environment.
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    let redis = RedisClient::connect(&config.redis_url).await?;
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;
    let metrics_handle = eterna_shared::middleware::init_metrics()?;
    metrics::describe_counter!("eterna_swipes_total", "Likes and passes recorded");
    metrics::describe_counter!("eterna_messages_sent_total", "Chat messages sent");
    metrics::describe_counter!("eterna_premium_subscriptions_total", "Premium plan purchases by plan");

    let stored = {
        let mut conn = db.get()?;
        settings::load(&mut conn)?
    };
    tracing::info!(maintenance_mode = stored.maintenance_mode, "system settings loaded");

    let state = Arc::new(AppState {
        db,
        config,
        redis,
        minio,
        settings: SettingsStore::new(stored),
        metrics_handle,
    });

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "eterna-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
