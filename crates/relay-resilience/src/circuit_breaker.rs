//! Circuit breaker for provider-wide failure protection.
//!
//! A single shared breaker models "the provider itself is unhealthy",
//! independent of which credential or caller is involved; credential health
//! is tracked separately in the pool and must not be conflated with circuit
//! health.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: `failure_count >= threshold` and the cool-down since the last
//!   failure has not yet elapsed
//!
//! The breaker self-heals: the first `is_open` poll after the cool-down
//! elapses resets the counter and reports closed. Successes decrement the
//! counter one step at a time (never below zero) so recovery is gradual and
//! a single success after a failure burst does not fully rearm the breaker.

use parking_lot::Mutex;
use relay_core::RelayError;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Number of failures to trip the circuit
    pub failure_threshold: u32,
    /// Cool-down before the breaker self-heals
    pub cool_down: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(300),
        }
    }
}

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Circuit is closed (allowing calls)
    Closed,
    /// Circuit is open (rejecting calls)
    Open,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerInner {
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

/// Process-wide circuit breaker
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BreakerConfig::default())
    }

    /// Check whether the breaker currently rejects calls.
    ///
    /// Resets the failure counter as a side effect when the cool-down has
    /// elapsed since the last failure.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.remaining_cool_down().is_some()
    }

    /// Check admission, returning a `CIRCUIT_OPEN` rejection when open
    ///
    /// # Errors
    /// Returns `RelayError::CircuitOpen` carrying the remaining cool-down
    pub fn check(&self) -> Result<(), RelayError> {
        match self.remaining_cool_down() {
            Some(remaining) => {
                warn!(retry_after_ms = remaining.as_millis(), "Circuit breaker open");
                Err(RelayError::circuit_open(Some(remaining)))
            }
            None => Ok(()),
        }
    }

    /// Record a provider-side failure
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_failure_at = Some(Instant::now());
        debug!(failure_count = inner.failure_count, "Circuit breaker failure recorded");
    }

    /// Record a successful call; decrements the failure counter by one
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_sub(1);
    }

    /// Get the observable state
    #[must_use]
    pub fn state(&self) -> BreakerState {
        if self.is_open() {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    /// Get the current failure count
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Remaining cool-down when open, resetting the counter when it has
    /// elapsed.
    fn remaining_cool_down(&self) -> Option<Duration> {
        let mut inner = self.inner.lock();

        if inner.failure_count < self.config.failure_threshold {
            return None;
        }

        let last = inner.last_failure_at?;
        let elapsed = last.elapsed();
        if elapsed < self.config.cool_down {
            Some(self.config.cool_down - elapsed)
        } else {
            // cool-down elapsed: self-heal on first observation
            inner.failure_count = 0;
            inner.last_failure_at = None;
            debug!("Circuit breaker cooled down, counter reset");
            None
        }
    }
}
