use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use eterna_shared::errors::{AppError, ErrorCode};

use crate::services::settings::SettingsStore;

/// Paths that stay reachable while maintenance mode is on.
const EXEMPT_PREFIXES: [&str; 2] = ["/api/admin", "/api/auth"];

fn blocked(path: &str) -> bool {
    path.starts_with("/api/")
        && !EXEMPT_PREFIXES
            .iter()
            .any(|p| path == *p || path.starts_with(&format!("{p}/")))
}

/// Answers 503 with the configured message for user-facing API routes while
/// `maintenance_mode` is set.
pub async fn maintenance_guard(
    State(settings): State<SettingsStore>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if blocked(req.uri().path()) {
        let current = settings.snapshot();
        if current.maintenance_mode {
            return AppError::new(ErrorCode::Maintenance, current.maintenance_message).into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::services::settings::SystemSettings;

    fn app(store: SettingsStore) -> Router {
        Router::new()
            .route("/api/discover", get(|| async { "ok" }))
            .route("/api/admin/settings", get(|| async { "ok" }))
            .route("/api/auth/login", get(|| async { "ok" }))
            .route("/health", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(store, maintenance_guard))
    }

    async fn status(app: Router, path: &str) -> StatusCode {
        app.oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn exemptions_match_whole_segments() {
        assert!(blocked("/api/discover"));
        assert!(!blocked("/api/admin/users"));
        assert!(!blocked("/api/auth"));
        assert!(blocked("/api/administrator"));
        assert!(!blocked("/api"));
        assert!(!blocked("/health"));
    }

    #[tokio::test]
    async fn passes_through_when_off() {
        let store = SettingsStore::default();
        assert_eq!(status(app(store), "/api/discover").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn blocks_user_routes_when_on() {
        let store = SettingsStore::new(SystemSettings {
            maintenance_mode: true,
            maintenance_message: "back at noon".into(),
            ..SystemSettings::default()
        });

        let res = app(store.clone())
            .oneshot(Request::get("/api/discover").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "back at noon");

        assert_eq!(status(app(store.clone()), "/api/admin/settings").await, StatusCode::OK);
        assert_eq!(status(app(store.clone()), "/api/auth/login").await, StatusCode::OK);
        assert_eq!(status(app(store), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn toggling_takes_effect_immediately() {
        let store = SettingsStore::default();
        let router = app(store.clone());
        let mut on = store.snapshot();
        on.maintenance_mode = true;
        store.replace(on);
        assert_eq!(status(router, "/api/discover").await, StatusCode::SERVICE_UNAVAILABLE);
    }
}
