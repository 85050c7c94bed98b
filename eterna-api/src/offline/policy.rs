use axum::http::{HeaderMap, HeaderValue, Method};

pub const API_PREFIX: &str = "/api/";
pub const OFFLINE_PATH: &str = "/offline";
pub const WORKER_PATH: &str = "/sw.js";

/// Extensions treated as immutable-ish static assets.
pub const ASSET_EXTENSIONS: [&str; 10] = [
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2",
];

/// App shell fetched when the worker installs.
pub const PRECACHE: [&str; 21] = [
    "/",
    "/dashboard",
    "/matches",
    "/search",
    "/profile/edit",
    "/settings",
    "/premium",
    "/verification",
    "/social",
    "/video",
    OFFLINE_PATH,
    "/manifest.json",
    "/favicon.svg",
    "/icon-72x72.svg",
    "/icon-96x96.svg",
    "/icon-128x128.svg",
    "/icon-144x144.svg",
    "/icon-152x152.svg",
    "/icon-192x192.svg",
    "/icon-384x384.svg",
    "/icon-512x512.svg",
];

const WORKER_TEMPLATE: &str = include_str!("../../assets/sw.js");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Non-GET requests; never cached.
    Mutation,
    /// The worker script itself; must always revalidate so updates land.
    Worker,
    Api,
    Static,
    Html,
    Other,
}

impl RequestClass {
    /// Mirrors the worker's fetch handler: API first, then precached paths and
    /// asset extensions, then pages that accept HTML.
    pub fn of(method: &Method, path: &str, headers: &HeaderMap) -> Self {
        if method != Method::GET && method != Method::HEAD {
            return Self::Mutation;
        }
        if path == WORKER_PATH {
            return Self::Worker;
        }
        if path.starts_with(API_PREFIX) || path == "/api" {
            return Self::Api;
        }
        if PRECACHE.contains(&path) || has_asset_extension(path) {
            return Self::Static;
        }
        let wants_html = headers
            .get("accept")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        if wants_html {
            Self::Html
        } else {
            Self::Other
        }
    }

    /// Cache-first classes may be stored for a day; network-first classes
    /// must revalidate every time.
    pub fn cache_control(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Mutation => "no-store",
            Self::Api => "private, no-cache",
            Self::Static => "public, max-age=86400",
            Self::Worker | Self::Html | Self::Other => "no-cache",
        })
    }
}

fn has_asset_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.ends_with('/') && ASSET_EXTENSIONS.contains(&ext))
}

/// The worker script for a given cache version.
pub fn render_worker(version: &str) -> String {
    let precache = serde_json::to_string(&PRECACHE).unwrap_or_else(|_| "[]".to_string());
    WORKER_TEMPLATE
        .replace("__VERSION__", version)
        .replace("__PRECACHE__", &precache)
        .replace("__ASSET_EXT__", &ASSET_EXTENSIONS.join("|"))
        .replace("__API_PREFIX__", API_PREFIX)
        .replace("__OFFLINE_PATH__", OFFLINE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(method: Method, path: &str, accept: Option<&str>) -> RequestClass {
        let mut headers = HeaderMap::new();
        if let Some(a) = accept {
            headers.insert("accept", HeaderValue::from_str(a).unwrap());
        }
        RequestClass::of(&method, path, &headers)
    }

    #[test]
    fn api_wins_over_extensions() {
        assert_eq!(class(Method::GET, "/api/photos/a.png", None), RequestClass::Api);
        assert_eq!(class(Method::GET, "/api", None), RequestClass::Api);
    }

    #[test]
    fn precached_paths_and_assets_are_static() {
        assert_eq!(class(Method::GET, "/matches", Some("text/html")), RequestClass::Static);
        assert_eq!(class(Method::GET, "/_next/app.JS", None), RequestClass::Other);
        assert_eq!(class(Method::GET, "/_next/app.js", None), RequestClass::Static);
        assert_eq!(class(Method::GET, "/fonts/inter.woff2", None), RequestClass::Static);
    }

    #[test]
    fn pages_and_everything_else() {
        assert_eq!(class(Method::GET, "/chat/123", Some("text/html,*/*")), RequestClass::Html);
        assert_eq!(class(Method::GET, "/chat/123", Some("application/json")), RequestClass::Other);
        assert_eq!(class(Method::GET, "/chat/123", None), RequestClass::Other);
    }

    #[test]
    fn writes_and_worker_are_special() {
        assert_eq!(class(Method::POST, "/api/likes", None), RequestClass::Mutation);
        assert_eq!(class(Method::GET, WORKER_PATH, None), RequestClass::Worker);
        assert_eq!(RequestClass::Mutation.cache_control(), "no-store");
        assert_eq!(RequestClass::Worker.cache_control(), "no-cache");
        assert_eq!(RequestClass::Static.cache_control(), "public, max-age=86400");
    }

    #[test]
    fn worker_has_no_unfilled_placeholders() {
        let script = render_worker("v42");
        assert!(!script.contains("__"));
        assert!(script.contains("'eterna-static-v42'"));
        assert!(script.contains("'eterna-dynamic-v42'"));
        assert!(script.contains("'eterna-api-v42'"));
        assert!(script.contains(r#""/offline""#));
        assert!(script.contains("js|css|png|jpg|jpeg|gif|svg|ico|woff|woff2"));
    }
}
