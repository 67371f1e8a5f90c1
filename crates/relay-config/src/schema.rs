//! Configuration schema definitions.
//!
//! This module defines all configuration types with validation and defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use validator::Validate;

/// Main relay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RelayConfig {
    /// Ordered credential list; entries may be `${ENV_VAR}` references
    pub credentials: Vec<String>,

    /// Ordered candidate call variants, cheapest first
    pub variants: Vec<String>,

    /// Per-scope rate limits
    #[validate(nested)]
    pub rate_limits: RateLimitsConfig,

    /// Circuit breaker configuration
    #[validate(nested)]
    pub circuit_breaker: BreakerSection,

    /// Maximum simultaneous outbound calls
    #[validate(range(min = 1, max = 10000))]
    pub max_concurrency: usize,

    /// Response cache configuration
    #[validate(nested)]
    pub cache: CacheSection,

    /// Retry/fallback configuration
    #[validate(nested)]
    pub retry: RetrySection,

    /// Delay before an unhealthy credential is rechecked
    #[serde(with = "humantime_serde")]
    pub credential_recheck_interval: Duration,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilitySection,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            variants: vec![
                "swift-1-mini".to_string(),
                "swift-1".to_string(),
                "swift-1-large".to_string(),
            ],
            rate_limits: RateLimitsConfig::default(),
            circuit_breaker: BreakerSection::default(),
            max_concurrency: 8,
            cache: CacheSection::default(),
            retry: RetrySection::default(),
            credential_recheck_interval: Duration::from_secs(90),
            observability: ObservabilitySection::default(),
        }
    }
}

impl RelayConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns validation errors if configuration is invalid
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()
    }

    /// Resolve credential entries, expanding `${ENV_VAR}` references.
    ///
    /// Unresolvable entries are dropped with a warning rather than failing
    /// startup; an empty result surfaces later as a configuration error on
    /// the first call.
    #[must_use]
    pub fn resolve_credentials(&self) -> Vec<String> {
        self.credentials
            .iter()
            .filter_map(|entry| {
                if entry.starts_with("${") && entry.ends_with('}') {
                    let name = &entry[2..entry.len() - 1];
                    match std::env::var(name) {
                        Ok(value) if !value.is_empty() => Some(value),
                        _ => {
                            warn!(var = name, "Credential environment variable not set");
                            None
                        }
                    }
                } else {
                    Some(entry.clone())
                }
            })
            .collect()
    }
}

/// Rate limit for one scope
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScopeLimit {
    /// Requests admitted per window
    #[validate(range(min = 1, max = 1000000))]
    pub limit: u32,

    /// Window size
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for ScopeLimit {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-scope rate limits, evaluated caller first, then tenant, then global
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RateLimitsConfig {
    /// Limit per caller scope
    #[validate(nested)]
    pub caller: ScopeLimit,

    /// Limit per tenant scope
    #[validate(nested)]
    pub tenant: ScopeLimit,

    /// Limit shared by all callers
    #[validate(nested)]
    pub global: ScopeLimit,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            caller: ScopeLimit {
                limit: 50,
                window: Duration::from_secs(60),
            },
            tenant: ScopeLimit {
                limit: 200,
                window: Duration::from_secs(60),
            },
            global: ScopeLimit {
                limit: 1000,
                window: Duration::from_secs(60),
            },
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BreakerSection {
    /// Number of failures to trip the circuit
    #[validate(range(min = 1, max = 100))]
    pub failure_threshold: u32,

    /// Cool-down before the breaker self-heals
    #[serde(with = "humantime_serde")]
    pub cool_down: Duration,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(300),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheSection {
    /// Whether caching is enabled
    pub enabled: bool,

    /// Time-to-live for cached completions
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Maximum number of cached entries
    #[validate(range(min = 1, max = 1000000))]
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(120),
            max_entries: 1024,
        }
    }
}

/// Retry/fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetrySection {
    /// Maximum number of attempts per call
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Base delay for exponential backoff
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Cap on computed backoff delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Per-attempt linear jitter factor
    #[serde(with = "humantime_serde")]
    pub jitter_factor: Duration,

    /// Cap applied to provider-supplied retry hints
    #[serde(with = "humantime_serde")]
    pub hint_cap: Duration,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter_factor: Duration::from_millis(250),
            hint_cap: Duration::from_secs(60),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct ObservabilitySection {
    /// Logging configuration
    #[validate(nested)]
    pub logging: LoggingSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level
    pub level: String,

    /// Log format (json, pretty)
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured)
    Json,
    /// Pretty format (human-readable)
    #[default]
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RelayConfig::default();
        assert!(config.validate_config().is_ok());
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.cool_down, Duration::from_secs(300));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.rate_limits.caller.limit, 50);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = RelayConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_resolve_literal_credentials() {
        let config = RelayConfig {
            credentials: vec!["sk-direct".to_string()],
            ..Default::default()
        };
        assert_eq!(config.resolve_credentials(), vec!["sk-direct".to_string()]);
    }

    #[test]
    fn test_resolve_env_credentials() {
        std::env::set_var("RELAY_TEST_CRED_A", "sk-from-env");
        let config = RelayConfig {
            credentials: vec![
                "${RELAY_TEST_CRED_A}".to_string(),
                "${RELAY_TEST_CRED_MISSING}".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(config.resolve_credentials(), vec!["sk-from-env".to_string()]);
        std::env::remove_var("RELAY_TEST_CRED_A");
    }

    #[test]
    fn test_duration_roundtrip() {
        let yaml = "circuit_breaker:\n  failure_threshold: 3\n  cool_down: 90s\n";
        let config: RelayConfig = serde_yaml::from_str(yaml).expect("parses");
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.cool_down, Duration::from_secs(90));
    }
}
