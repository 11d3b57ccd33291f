//! Tracing subscriber setup

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Map a configured level name to a tracing level, defaulting to INFO
pub fn parse_level(log_level: &str) -> Level {
    match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber
///
/// `format` selects JSON output (`"json"`) or human-readable output
/// (`"pretty"`); anything else is treated as JSON.
pub fn init_tracing(log_level: &str, format: &str) -> Result<(), LoggingError> {
    let filter = LevelFilter::from_level(parse_level(log_level));

    if format.eq_ignore_ascii_case("pretty") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    }

    Ok(())
}
