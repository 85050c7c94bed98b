pub mod policy;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use policy::RequestClass;

const OFFLINE_PAGE: &str = include_str!("../../assets/offline.html");

/// `/sw.js` and `/offline`. The worker is rendered once per process.
pub fn routes(cache_version: &str) -> Router {
    let script: Arc<str> = policy::render_worker(cache_version).into();
    Router::new()
        .route(policy::WORKER_PATH, get(service_worker))
        .route(policy::OFFLINE_PATH, get(offline_page))
        .with_state(script)
}

async fn service_worker(State(script): State<Arc<str>>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::HeaderName::from_static("service-worker-allowed"), "/"),
        ],
        script.to_string(),
    )
}

async fn offline_page() -> Html<&'static str> {
    Html(OFFLINE_PAGE)
}

/// Sets `Cache-Control` from the request class unless the handler chose one.
pub async fn cache_headers(req: Request<Body>, next: Next) -> Response {
    let class = RequestClass::of(req.method(), req.uri().path(), req.headers());
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .entry(header::CACHE_CONTROL)
        .or_insert_with(|| class.cache_control());
    response
}
