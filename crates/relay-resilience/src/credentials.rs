//! Credential pool with round-robin selection and health rechecks.
//!
//! Membership is fixed at construction. Selection cycles through the
//! currently-healthy subset; when nothing is healthy the pool degrades to
//! the full list rather than failing outright, so `acquire` returns `None`
//! only for an empty pool (a configuration error).
//!
//! Marking a credential unhealthy schedules one deferred recheck that
//! issues a minimal canary probe through the backend and clears the flag on
//! success. Rechecks are independent; a failed recheck leaves the flag set
//! until a later marking schedules a new one.

use parking_lot::Mutex;
use relay_core::{CompletionBackend, Credential};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One credential slot in the pool
pub struct PoolEntry {
    index: usize,
    credential: Credential,
    healthy: AtomicBool,
    recheck_pending: AtomicBool,
    last_marked_unhealthy: Mutex<Option<Instant>>,
}

impl PoolEntry {
    fn new(index: usize, credential: Credential) -> Self {
        Self {
            index,
            credential,
            healthy: AtomicBool::new(true),
            recheck_pending: AtomicBool::new(false),
            last_marked_unhealthy: Mutex::new(None),
        }
    }

    /// Position of this credential in the configured order
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The credential secret
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Whether this credential is currently considered healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// When this credential was last marked unhealthy, if ever
    #[must_use]
    pub fn last_marked_unhealthy(&self) -> Option<Instant> {
        *self.last_marked_unhealthy.lock()
    }
}

/// Ordered pool of interchangeable provider credentials
pub struct CredentialPool {
    entries: Vec<Arc<PoolEntry>>,
    cursor: AtomicUsize,
    recheck_interval: Duration,
    prober: Arc<dyn CompletionBackend>,
}

impl CredentialPool {
    /// Create a pool over an ordered credential list.
    ///
    /// `prober` issues the minimal canary call used by health rechecks.
    #[must_use]
    pub fn new(
        credentials: Vec<Credential>,
        recheck_interval: Duration,
        prober: Arc<dyn CompletionBackend>,
    ) -> Self {
        let entries = credentials
            .into_iter()
            .enumerate()
            .map(|(index, credential)| Arc::new(PoolEntry::new(index, credential)))
            .collect();

        Self {
            entries,
            cursor: AtomicUsize::new(0),
            recheck_interval,
            prober,
        }
    }

    /// Select the next credential, round-robin over the eligible subset.
    ///
    /// Prefers healthy credentials; degrades to the full list when none are
    /// healthy. Returns `None` only when the pool is empty.
    #[must_use]
    pub fn acquire(&self) -> Option<Arc<PoolEntry>> {
        if self.entries.is_empty() {
            return None;
        }

        let healthy: Vec<&Arc<PoolEntry>> =
            self.entries.iter().filter(|e| e.is_healthy()).collect();

        let eligible: Vec<&Arc<PoolEntry>> = if healthy.is_empty() {
            warn!("No healthy credentials; degrading to full pool");
            self.entries.iter().collect()
        } else {
            healthy
        };

        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(eligible[n % eligible.len()]))
    }

    /// Mark a credential unhealthy and schedule one deferred recheck.
    ///
    /// The recheck runs as an independent task and does not block the call
    /// that triggered the marking. Markings while a recheck is already
    /// pending do not pile up additional tasks.
    pub fn mark_unhealthy(&self, entry: &Arc<PoolEntry>) {
        entry.healthy.store(false, Ordering::Relaxed);
        *entry.last_marked_unhealthy.lock() = Some(Instant::now());

        if entry.recheck_pending.swap(true, Ordering::Relaxed) {
            debug!(credential = entry.index, "Recheck already pending");
            return;
        }

        warn!(
            credential = entry.index,
            recheck_in_s = self.recheck_interval.as_secs(),
            "Credential marked unhealthy"
        );

        let entry = Arc::clone(entry);
        let prober = Arc::clone(&self.prober);
        let interval = self.recheck_interval;

        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let recovered = prober.probe(entry.credential()).await;
            entry.recheck_pending.store(false, Ordering::Relaxed);
            if recovered {
                entry.healthy.store(true, Ordering::Relaxed);
                info!(credential = entry.index, "Credential recovered");
            } else {
                warn!(credential = entry.index, "Credential recheck failed");
            }
        });
    }

    /// Healthy credentials other than `entry`, i.e. rotation candidates
    #[must_use]
    pub fn healthy_alternates(&self, entry: &PoolEntry) -> usize {
        self.entries
            .iter()
            .filter(|e| e.index != entry.index && e.is_healthy())
            .count()
    }

    /// Total credential count
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Currently-healthy credential count
    #[must_use]
    pub fn healthy_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_healthy()).count()
    }

    /// Check if the pool has no credentials at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
