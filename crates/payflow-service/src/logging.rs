//! Logging initialization.
//!
//! Logs go to stderr so that stdout carries only the batch response.

use payflow_core::LogFormat;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unsupported log level '{level}'")]
    InvalidLevel { level: String },

    #[error("Failed to install the log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Parse a `LOG_LEVEL` value, case-insensitively
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.to_ascii_uppercase().as_str() {
        "TRACE" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" => Ok(LevelFilter::WARN),
        "ERROR" => Ok(LevelFilter::ERROR),
        _ => Err(LoggingError::InvalidLevel {
            level: level.to_string(),
        }),
    }
}

/// Build the filter for the configured level
pub fn filter(level: &str) -> Result<EnvFilter, LoggingError> {
    Ok(EnvFilter::default().add_directive(parse_level(level)?.into()))
}

/// Install the global subscriber
pub fn init(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let json = matches!(format, LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
    });
    let pretty = matches!(format, LogFormat::Pretty)
        .then(|| fmt::layer().pretty().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter(level)?)
        .with(json)
        .with(pretty)
        .try_init()?;

    Ok(())
}
