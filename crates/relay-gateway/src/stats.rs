//! Read-only statistics snapshot.
//!
//! Exposed for operational observability; nothing in the resilience logic
//! consults these values.

use relay_resilience::CacheStats;
use serde::Serialize;

/// Point-in-time snapshot of the relay's shared state
#[derive(Debug, Clone, Serialize)]
pub struct RelayStats {
    /// Circuit breaker state
    pub breaker: BreakerStats,
    /// Credential pool health
    pub credentials: CredentialStats,
    /// Response cache descriptor
    pub cache: CacheSnapshot,
    /// Concurrency gate descriptor
    pub gate: GateStats,
}

/// Circuit breaker snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    /// Observable state ("closed" or "open")
    pub state: String,
    /// Current failure count
    pub failure_count: u32,
}

/// Credential pool snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStats {
    /// Total configured credentials
    pub total: usize,
    /// Currently-healthy credentials
    pub healthy: usize,
}

/// Response cache snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    /// Current number of entries
    pub entries: usize,
    /// Total hits
    pub hits: u64,
    /// Total misses
    pub misses: u64,
    /// Hit rate percentage
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheSnapshot {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Concurrency gate snapshot
#[derive(Debug, Clone, Serialize)]
pub struct GateStats {
    /// Configured capacity
    pub capacity: usize,
    /// Slots currently available
    pub available: usize,
    /// Calls currently in flight
    pub in_flight: usize,
}
