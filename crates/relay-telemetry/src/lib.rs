//! # Relay Telemetry
//!
//! Observability for the completion relay:
//! - Structured logging configuration and initialization
//! - Prometheus metrics for calls, rejections, and cache behavior

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError, SpanEvents};
pub use metrics::{Metrics, MetricsConfig};
