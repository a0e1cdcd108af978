use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Immutable cached value with the time it was computed.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

/// Time-to-live cache holding a single snapshot.
///
/// Readers get an `Arc` to a complete snapshot; writers swap in a new `Arc`
/// under the write lock, so a reader never sees a half-written entry. A
/// snapshot is fresh while `now - timestamp < ttl`.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Arc<Snapshot<T>>>>,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new(Duration::seconds(secs.min(i64::MAX as u64) as i64))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot if it is still fresh at `now`.
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<Arc<Snapshot<T>>> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|snap| now - snap.timestamp < self.ttl)
            .cloned()
    }

    /// Replace the cached snapshot in a single assignment.
    pub fn replace(&self, now: DateTime<Utc>, payload: T) -> Arc<Snapshot<T>> {
        let snap = Arc::new(Snapshot {
            timestamp: now,
            payload,
        });
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::clone(&snap));
        snap
    }

    /// Return the fresh snapshot, or compute and store a new one.
    ///
    /// The second element is `true` on a cache hit. `compute` runs outside
    /// the lock; concurrent misses may both compute and the last write wins.
    pub fn get_or_refresh(
        &self,
        now: DateTime<Utc>,
        compute: impl FnOnce() -> T,
    ) -> (Arc<Snapshot<T>>, bool) {
        if let Some(snap) = self.get_fresh(now) {
            tracing::debug!(age_secs = (now - snap.timestamp).num_seconds(), "Cache hit");
            return (snap, true);
        }
        tracing::debug!("Cache miss, recomputing");
        (self.replace(now, compute()), false)
    }

    pub fn invalidate(&self) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
