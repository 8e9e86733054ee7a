//! Centralized logging initialization with environment variable support

use crate::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: Standard Rust log filter (takes precedence over all)
/// - `LOG_FORMAT`: Override format (compact, pretty, json)
///
/// # Examples
///
/// ```bash
/// # Show every copied file and rewritten import
/// graft -v ../myproj
///
/// # Module-specific filtering
/// RUST_LOG=graft_engine::rewriter=debug graft ../myproj
/// ```
pub fn initialize(config: &LoggingConfig) {
    let env_filter = build_filter(&config.level, std::env::var("RUST_LOG").ok().as_deref());

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        })
        .unwrap_or(config.format);

    // Always write to stderr; stdout carries the run summary
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already initialized");
    }
}

/// `RUST_LOG` when set and valid, the configured level otherwise
fn build_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
        })
}

/// Create a span grouping every log line of one update run
///
/// # Example
///
/// ```rust
/// use graft_config::logging::run_span;
///
/// let span = run_span("myproj", "taskflow");
/// let _enter = span.enter();
/// tracing::info!("Copying modules");
/// ```
pub fn run_span(base: &str, library: &str) -> tracing::Span {
    tracing::info_span!("update", base = %base, library = %library)
}
