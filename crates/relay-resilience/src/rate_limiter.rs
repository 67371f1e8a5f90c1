//! Fixed-window rate limiting keyed by scope string.
//!
//! Each scope (caller, tenant, global) tracks its own window; the limit and
//! window size arrive with every check so differently-configured scopes can
//! share one limiter. Fixed windows are deliberate: this is a cost and
//! abuse guard, not a billing-grade limiter, and a window boundary may
//! admit up to twice the limit across two adjacent windows.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Requests remaining in the current window
    pub remaining: u32,
    /// Time until the window resets (set on denial)
    pub retry_after: Option<Duration>,
}

/// State for a single scope's window
#[derive(Debug, Clone, Copy)]
struct FixedWindow {
    count: u32,
    started: Instant,
}

/// Fixed-window rate limiter with per-scope windows
pub struct RateLimiter {
    windows: RwLock<HashMap<String, FixedWindow>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Check one scope against its limit.
    ///
    /// Admitted requests increment the window count; denied requests do
    /// not. An elapsed window is replaced wholesale with a fresh one.
    pub async fn check(&self, scope: &str, limit: u32, window: Duration) -> RateDecision {
        if limit == 0 {
            warn!(scope = %scope, "Rate limit check with zero limit");
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(window),
            };
        }

        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let entry = windows.entry(scope.to_string()).or_insert(FixedWindow {
            count: 0,
            started: now,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= window {
            // window elapsed: start fresh, this request is the first of it
            entry.count = 1;
            entry.started = now;
            debug!(scope = %scope, "Rate window reset");
            return RateDecision {
                allowed: true,
                remaining: limit - 1,
                retry_after: None,
            };
        }

        if entry.count < limit {
            entry.count += 1;
            debug!(scope = %scope, count = entry.count, limit, "Rate limit check passed");
            RateDecision {
                allowed: true,
                remaining: limit - entry.count,
                retry_after: None,
            }
        } else {
            let retry_after = window - elapsed;
            warn!(
                scope = %scope,
                limit,
                retry_after_ms = retry_after.as_millis(),
                "Rate limit exceeded"
            );
            RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(retry_after),
            }
        }
    }

    /// Get the admitted count of a scope's current window (stats/tests)
    pub async fn window_count(&self, scope: &str) -> Option<u32> {
        self.windows.read().await.get(scope).map(|w| w.count)
    }

    /// Get the number of tracked scopes
    pub async fn scope_count(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Drop windows whose last activity is older than `max_age`
    pub async fn cleanup(&self, max_age: Duration) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        windows.retain(|scope, w| {
            let stale = now.duration_since(w.started) > max_age;
            if stale {
                debug!(scope = %scope, "Dropped stale rate window");
            }
            !stale
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
