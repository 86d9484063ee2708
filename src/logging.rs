//! Tracing subscriber setup

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Error installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber is already installed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Map a level name to a filter; unknown names fall back to `info`
pub fn level_filter(log_level: &str) -> LevelFilter {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    LevelFilter::from_level(level)
}

/// Install the global subscriber
///
/// `format` is `json` for one JSON object per event, anything else for
/// human-readable output. Events go to stderr so command output on stdout
/// stays clean.
pub fn init_tracing(log_level: &str, format: &str) -> Result<(), LoggingError> {
    let filter = level_filter(log_level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| LoggingError::Init(e.to_string()))
}

/// Install the global subscriber from configuration
pub fn init_from_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    init_tracing(&config.level, &config.format)
}
