use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line shape, chosen by `ETERNA_LOG_FORMAT` or, when unset, by
/// `ETERNA_ENV` (json in production, pretty elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn resolve(format: Option<&str>, env: Option<&str>) -> Self {
        match format.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            Some("pretty") => Self::Pretty,
            _ if env == Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Filter used when `RUST_LOG` is absent: the service's own crate at debug.
pub fn default_filter(service_name: &str) -> String {
    format!("info,{}=debug,eterna_shared=debug,tower_http=debug", service_name.replace('-', "_"))
}

pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    let format = LogFormat::resolve(
        std::env::var("ETERNA_LOG_FORMAT").ok().as_deref(),
        std::env::var("ETERNA_ENV").ok().as_deref(),
    );

    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
    });
    let pretty = (format == LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
    });
    let compact = (format == LogFormat::Compact).then(|| tracing_subscriber::fmt::layer().compact());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(pretty)
        .with(compact)
        .init();

    tracing::info!(service = service_name, format = ?format, "tracing initialized");
}
