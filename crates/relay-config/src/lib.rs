//! # Relay Config
//!
//! Configuration for the completion relay:
//! - Schema definitions with validation and defaults
//! - Loading from YAML, TOML, and JSON with environment substitution

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod loader;
pub mod schema;

// Re-export main types
pub use loader::{ConfigError, ConfigLoader, ConfigSource};
pub use schema::{
    BreakerSection, CacheSection, LogFormat, LoggingSection, ObservabilitySection,
    RateLimitsConfig, RelayConfig, RetrySection, ScopeLimit,
};
