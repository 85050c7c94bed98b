pub mod config;
pub mod maintenance;
pub mod models;
pub mod offline;
pub mod routes;
pub mod schema;
pub mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use eterna_shared::clients::db::DbPool;
use eterna_shared::clients::minio::MinioClient;
use eterna_shared::clients::redis::RedisClient;
use eterna_shared::middleware::metrics_middleware;

use config::AppConfig;
use services::settings::SettingsStore;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub redis: RedisClient,
    pub minio: MinioClient,
    pub settings: SettingsStore,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Room for a 5 MiB photo plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Profile & photos
        .route(
            "/profile",
            get(routes::profile::get_profile)
                .post(routes::profile::create_profile)
                .put(routes::profile::update_profile),
        )
        .route("/profile/photos", put(routes::profile::replace_photos))
        .route(
            "/photos/upload",
            post(routes::photos::upload_photo).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Discovery, likes, matches
        .route("/discover", get(routes::discover::discover))
        .route("/likes", post(routes::likes::send_like).get(routes::likes::received_likes))
        .route("/matches", get(routes::matches::list_matches))
        .route(
            "/matches/:id",
            get(routes::matches::get_match).delete(routes::matches::unmatch),
        )
        // Chat
        .route(
            "/messages/:match_id",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/messages/:match_id/read", post(routes::messages::mark_read))
        // Notifications & push
        .route(
            "/notifications",
            get(routes::notifications::list_notifications).post(routes::notifications::create_notification),
        )
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/read-all", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .route("/push/subscribe", post(routes::push::subscribe))
        .route("/push/unsubscribe", post(routes::push::unsubscribe))
        .route("/push/config", get(routes::push::push_config))
        // Reports & premium
        .route("/reports", post(routes::reports::create_report))
        .route("/premium/plans", get(routes::premium::list_plans))
        .route("/premium/status", get(routes::premium::status))
        .route("/premium/subscribe", post(routes::premium::subscribe))
        // Admin console
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/:id", patch(routes::admin::update_user))
        .route("/admin/reports", get(routes::admin::list_reports))
        .route("/admin/reports/:id", patch(routes::admin::update_report))
        .route(
            "/admin/settings",
            get(routes::admin::get_settings).patch(routes::admin::update_settings),
        )
        .route("/admin/analytics", get(routes::admin::analytics))
}

/// Full application router: API under `/api`, health and metrics at the
/// root, plus the offline worker and page.
pub fn app(state: Arc<AppState>) -> Router {
    let maintenance = axum::middleware::from_fn_with_state(
        state.settings.clone(),
        maintenance::maintenance_guard,
    );
    let cache_version = state.config.cache_version.clone();

    Router::new()
        .nest("/api", api_routes())
        .merge(routes::index::router())
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .with_state(state)
        .merge(offline::routes(&cache_version))
        .route_layer(axum::middleware::from_fn(metrics_middleware))
        .layer(maintenance)
        .layer(axum::middleware::from_fn(offline::cache_headers))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
