//! Per-unit critical sections
//!
//! Commits for the same unit id are serialized; different units proceed
//! in parallel. Entries are removed once nobody holds or waits on them.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct UnitLocks {
    locks: Mutex<FxHashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one unit's commit
pub struct UnitGuard<'a> {
    registry: &'a UnitLocks,
    unit_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UnitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `unit_id`
    pub async fn lock(&self, unit_id: &str) -> UnitGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock();
            locks.entry(unit_id.to_string()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        UnitGuard { registry: self, unit_id: unit_id.to_string(), guard: Some(guard) }
    }

    /// Number of unit ids currently held or awaited
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.registry.locks.lock();
        // Release while the registry is locked so no new waiter can clone in between
        self.guard.take();
        if let Some(mutex) = locks.get(&self.unit_id) {
            if Arc::strong_count(mutex) == 1 {
                locks.remove(&self.unit_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = UnitLocks::new();
        {
            let _guard = locks.lock("unit-1").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_units_do_not_block() {
        let locks = UnitLocks::new();
        let _a = locks.lock("unit-1").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("unit-2"))
            .await
            .expect("second unit should not wait");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_unit_is_serialized() {
        let locks = Arc::new(UnitLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                tokio::spawn(async move {
                    let _guard = locks.lock("unit-1").await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }
}
