//! Structured logging configuration.
//!
//! Provides configurable logging with:
//! - JSON or pretty format
//! - Log level filtering
//! - Optional span events

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json or pretty)
    pub format: LogFormat,
    /// Include timestamps
    pub timestamps: bool,
    /// Include span events
    pub span_events: SpanEvents,
    /// Filter directives (e.g., "tokio=warn")
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Pretty,
            timestamps: true,
            span_events: SpanEvents::None,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enable JSON format
    #[must_use]
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Enable pretty format
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Set span events
    #[must_use]
    pub fn with_span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    /// Set filter directives
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Get the tracing Level
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured)
    Json,
    /// Pretty format (human-readable)
    #[default]
    Pretty,
}

/// Span event configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanEvents {
    /// No span events
    #[default]
    None,
    /// Log when spans are entered
    Enter,
    /// Log when spans are exited
    Exit,
    /// Log both enter and exit
    Full,
}

impl SpanEvents {
    fn to_fmt_span(self) -> FmtSpan {
        match self {
            Self::None => FmtSpan::NONE,
            Self::Enter => FmtSpan::ENTER,
            Self::Exit => FmtSpan::EXIT,
            Self::Full => FmtSpan::ENTER | FmtSpan::EXIT,
        }
    }
}

/// Initialize logging with the given configuration
///
/// # Errors
/// Returns error if the filter fails to parse or a global subscriber is
/// already installed
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = build_filter(config)?;

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(config.span_events.to_fmt_span())
                .with_target(true)
                .with_thread_ids(true);

            tracing_subscriber::registry()
                .with(layer.with_filter(filter))
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_span_events(config.span_events.to_fmt_span())
                .with_target(true);

            let layer = if config.timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            };

            tracing_subscriber::registry()
                .with(layer.with_filter(filter))
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))
        }
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    // RUST_LOG wins over configured level
    let base_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if let Some(ref filter_str) = config.filter {
        EnvFilter::try_new(format!("{},{}", config.level, filter_str))
            .map_err(|e| LoggingError::FilterParse(e.to_string()))
    } else {
        Ok(base_filter)
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    Init(String),
    /// Failed to parse filter
    #[error("Failed to parse log filter: {0}")]
    FilterParse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LoggingConfig::new()
            .with_level("debug")
            .json()
            .with_filter("tokio=warn");

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, Some("tokio=warn".to_string()));
    }

    #[test]
    fn test_tracing_level() {
        assert_eq!(LoggingConfig::new().with_level("trace").tracing_level(), Level::TRACE);
        assert_eq!(LoggingConfig::new().with_level("DEBUG").tracing_level(), Level::DEBUG);
        assert_eq!(LoggingConfig::new().with_level("error").tracing_level(), Level::ERROR);
        assert_eq!(LoggingConfig::new().with_level("bogus").tracing_level(), Level::INFO);
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LoggingConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_span_events() {
        assert_eq!(SpanEvents::None.to_fmt_span(), FmtSpan::NONE);
        assert_eq!(SpanEvents::Enter.to_fmt_span(), FmtSpan::ENTER);
        assert_eq!(SpanEvents::Full.to_fmt_span(), FmtSpan::ENTER | FmtSpan::EXIT);
    }
}
