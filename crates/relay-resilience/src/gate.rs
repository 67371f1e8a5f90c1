//! Concurrency gate bounding simultaneous outbound calls.
//!
//! The gate never queues: a full gate rejects immediately so the façade can
//! return a fast busy response instead of building an unbounded backlog.
//! Permits are RAII: release happens exactly once when the permit drops,
//! on every exit path.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Bounded admission gate for outbound calls
pub struct InflightGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl InflightGate {
    /// Create a gate with a fixed capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Try to acquire a slot without blocking
    #[must_use]
    pub fn try_acquire(&self) -> Option<InflightPermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Some(InflightPermit { _permit: permit }),
            Err(_) => {
                debug!(capacity = self.capacity, "Concurrency gate full");
                None
            }
        }
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently available
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Calls currently in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

/// A held concurrency slot; dropping it releases the slot
pub struct InflightPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capacity_enforced() {
        let gate = InflightGate::new(2);

        let p1 = gate.try_acquire().expect("first slot");
        let p2 = gate.try_acquire().expect("second slot");
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_flight(), 2);

        drop(p1);
        assert!(gate.try_acquire().is_some());
        drop(p2);
    }

    #[tokio::test]
    async fn test_permit_drop_releases() {
        let gate = InflightGate::new(1);
        {
            let _permit = gate.try_acquire().expect("slot");
            assert_eq!(gate.available(), 0);
        }
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_release_on_early_return() {
        let gate = InflightGate::new(1);

        fn failing_path(gate: &InflightGate) -> Result<(), String> {
            let _permit = gate.try_acquire().ok_or("busy")?;
            Err("provider exploded".to_string())
        }

        assert!(failing_path(&gate).is_err());
        assert_eq!(gate.available(), 1, "slot must be released on the error path");
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity_concurrently() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let gate = Arc::new(InflightGate::new(3));
        let peak = Arc::new(AtomicUsize::new(0));
        let current = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let gate = Arc::clone(&gate);
            let peak = Arc::clone(&peak);
            let current = Arc::clone(&current);
            handles.push(tokio::spawn(async move {
                if let Some(_permit) = gate.try_acquire() {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.available(), 3);
    }
}
