//! # Relay Gateway
//!
//! The façade over the resilience components. `CompletionRelay` is the one
//! entry point for outbound generative calls; per call it sequences the
//! circuit breaker, the per-scope rate limits, the response cache, the
//! concurrency gate, and the retry/fallback executor, in that fixed order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod relay;
pub mod stats;

// Re-export main types
pub use relay::{CompletionRelay, RelayBuilder};
pub use stats::{BreakerStats, CacheSnapshot, CredentialStats, GateStats, RelayStats};

// Re-export the core contract types callers interact with
pub use relay_core::{Completion, CompletionBackend, RelayError, RelayResult};
