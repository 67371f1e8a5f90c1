//! Error types for the relay.
//!
//! `RelayError` is the caller-facing hierarchy; every variant maps to a
//! stable machine-readable code so the host collaborator can branch on
//! rejections without inspecting internals. `AttemptError` is the
//! per-attempt classification the retry executor branches on; error class
//! is data here, not control flow.

use crate::types::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `RelayError`
pub type RelayResult<T> = Result<T, RelayError>;

/// Caller-facing relay error covering all rejection and failure scenarios
#[derive(Debug, Error)]
pub enum RelayError {
    /// Request validation failed (unsupported kind or malformed payload)
    #[error("Invalid request: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Field that failed validation (if applicable)
        field: Option<String>,
    },

    /// Relay is misconfigured (no credentials present)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Circuit breaker is open
    #[error("Circuit breaker open")]
    CircuitOpen {
        /// Time until the breaker cools down
        retry_after: Option<Duration>,
    },

    /// A rate-limit scope denied the request
    #[error("Rate limit exceeded for scope {scope}")]
    RateLimit {
        /// Scope that denied the request
        scope: String,
        /// The limit that was exceeded
        limit: u32,
        /// Time until the window resets
        retry_after: Duration,
    },

    /// The concurrency gate is full
    #[error("Concurrency limit reached: {capacity} calls already in flight")]
    ConcurrencyLimit {
        /// Configured gate capacity
        capacity: usize,
    },

    /// The provider could not serve the request after all retries
    #[error("Provider exhausted after {attempts} attempt(s): {detail}")]
    ProviderExhausted {
        /// Number of attempts consumed
        attempts: u32,
        /// Detail from the last provider error
        detail: String,
    },
}

impl RelayError {
    /// Get the machine-readable code for this error
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "INVALID_REQUEST",
            Self::Configuration { .. } => "CONFIG_ERROR",
            Self::CircuitOpen { .. } => "CIRCUIT_OPEN",
            Self::RateLimit { .. } => "RATE_LIMIT",
            Self::ConcurrencyLimit { .. } => "CONCURRENCY_LIMIT",
            Self::ProviderExhausted { .. } => "PROVIDER_EXHAUSTED",
        }
    }

    /// Check if this error is a fast rejection (no provider call attempted)
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::CircuitOpen { .. }
                | Self::RateLimit { .. }
                | Self::ConcurrencyLimit { .. }
        )
    }

    /// Get the retry-after hint, where applicable
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            Self::CircuitOpen { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a circuit-open rejection
    #[must_use]
    pub fn circuit_open(retry_after: Option<Duration>) -> Self {
        Self::CircuitOpen { retry_after }
    }

    /// Create a rate-limit rejection
    #[must_use]
    pub fn rate_limit(scope: impl Into<String>, limit: u32, retry_after: Duration) -> Self {
        Self::RateLimit {
            scope: scope.into(),
            limit,
            retry_after,
        }
    }

    /// Create a concurrency-limit rejection
    #[must_use]
    pub fn concurrency_limit(capacity: usize) -> Self {
        Self::ConcurrencyLimit { capacity }
    }

    /// Create a provider-exhausted failure
    #[must_use]
    pub fn provider_exhausted(attempts: u32, detail: impl Into<String>) -> Self {
        Self::ProviderExhausted {
            attempts,
            detail: detail.into(),
        }
    }
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::InvalidRequestKind { .. } => Some("kind".to_string()),
            ValidationError::InvalidScope { .. } => Some("scope".to_string()),
            ValidationError::EmptyContent | ValidationError::ContentTooLarge { .. } => {
                Some("content".to_string())
            }
            ValidationError::InvalidCredential { .. } => None,
        };
        Self::Validation {
            message: err.to_string(),
            field,
        }
    }
}

/// Classification of a single backend attempt.
///
/// The retry executor branches on these tags: a transient error backs off
/// and retries, an exhaustion error additionally rotates credentials, an
/// unsupported variant skips to the next candidate within the same attempt,
/// and a fatal error terminates the call.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    /// Temporary provider unavailability; retry with backoff
    #[error("Transient provider error: {detail}")]
    Transient {
        /// Provider error detail
        detail: String,
    },

    /// Quota/exhaustion-class error; rotate credentials and back off
    #[error("Provider quota exhausted: {detail}")]
    Exhausted {
        /// Provider error detail
        detail: String,
        /// Provider-supplied retry hint, if present
        retry_after: Option<Duration>,
    },

    /// The candidate variant does not exist or cannot serve this request
    #[error("Variant {variant} not supported for this request")]
    UnsupportedVariant {
        /// The rejected variant
        variant: String,
    },

    /// Non-retryable provider error; terminate the call
    #[error("Fatal provider error: {detail}")]
    Fatal {
        /// Provider error detail
        detail: String,
    },
}

impl AttemptError {
    /// Check if this attempt outcome consumes retry budget
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Exhausted { .. })
    }

    /// Get the provider-supplied retry hint, if any
    #[must_use]
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            Self::Exhausted { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Create a transient error
    #[must_use]
    pub fn transient(detail: impl Into<String>) -> Self {
        Self::Transient {
            detail: detail.into(),
        }
    }

    /// Create an exhaustion error with an optional retry hint
    #[must_use]
    pub fn exhausted(detail: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::Exhausted {
            detail: detail.into(),
            retry_after,
        }
    }

    /// Create an unsupported-variant error
    #[must_use]
    pub fn unsupported(variant: impl Into<String>) -> Self {
        Self::UnsupportedVariant {
            variant: variant.into(),
        }
    }

    /// Create a fatal error
    #[must_use]
    pub fn fatal(detail: impl Into<String>) -> Self {
        Self::Fatal {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RelayError::validation("bad", None).code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            RelayError::configuration("no credentials").code(),
            "CONFIG_ERROR"
        );
        assert_eq!(RelayError::circuit_open(None).code(), "CIRCUIT_OPEN");
        assert_eq!(
            RelayError::rate_limit("caller:a", 50, Duration::from_secs(59)).code(),
            "RATE_LIMIT"
        );
        assert_eq!(RelayError::concurrency_limit(5).code(), "CONCURRENCY_LIMIT");
        assert_eq!(
            RelayError::provider_exhausted(5, "quota").code(),
            "PROVIDER_EXHAUSTED"
        );
    }

    #[test]
    fn test_rejection_classification() {
        assert!(RelayError::validation("bad", None).is_rejection());
        assert!(RelayError::circuit_open(None).is_rejection());
        assert!(RelayError::concurrency_limit(5).is_rejection());
        assert!(!RelayError::configuration("x").is_rejection());
        assert!(!RelayError::provider_exhausted(5, "x").is_rejection());
    }

    #[test]
    fn test_retry_after_carried() {
        let err = RelayError::rate_limit("caller:a", 50, Duration::from_secs(59));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(59)));

        let err = RelayError::circuit_open(Some(Duration::from_secs(120)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));

        assert_eq!(RelayError::concurrency_limit(5).retry_after(), None);
    }

    #[test]
    fn test_attempt_error_classes() {
        assert!(AttemptError::transient("503").is_retryable());
        assert!(AttemptError::exhausted("quota", None).is_retryable());
        assert!(!AttemptError::unsupported("swift-1").is_retryable());
        assert!(!AttemptError::fatal("bad key").is_retryable());
    }

    #[test]
    fn test_retry_hint_only_on_exhaustion() {
        let hint = Duration::from_secs(30);
        assert_eq!(
            AttemptError::exhausted("quota", Some(hint)).retry_hint(),
            Some(hint)
        );
        assert_eq!(AttemptError::transient("503").retry_hint(), None);
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: RelayError = ValidationError::EmptyContent.into();
        assert_eq!(err.code(), "INVALID_REQUEST");
        match err {
            RelayError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("content"));
            }
            _ => panic!("expected validation error"),
        }
    }
}
