//! # Relay Resilience
//!
//! Resilience components for the completion relay:
//! - Credential pool with round-robin selection and health rechecks
//! - Circuit breaker for provider-wide failure protection
//! - Fixed-window rate limiting keyed by scope
//! - Response caching keyed by canonical request fingerprints
//! - Concurrency gate bounding simultaneous outbound calls
//! - Retry/fallback executor with backoff and credential rotation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod credentials;
pub mod executor;
pub mod gate;
pub mod rate_limiter;

// Re-export main types
pub use cache::{CacheConfig, CacheStats, Fingerprint, ResponseCache};
pub use circuit_breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use credentials::{CredentialPool, PoolEntry};
pub use executor::{ExecutorConfig, RetryExecutor};
pub use gate::{InflightGate, InflightPermit};
pub use rate_limiter::{RateDecision, RateLimiter};
