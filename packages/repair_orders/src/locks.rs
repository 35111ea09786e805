// ABOUTME: Per-repair-order async mutex registry
// ABOUTME: Serializes writers to the same RO inside one process; different ROs never contend

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
pub struct RoLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl RoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one RO. The guard releases on drop.
    pub async fn acquire(&self, ro_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Drop entries nobody holds or waits on
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(ro_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of ROs with a live lock entry
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_ro_is_serialized() {
        let locks = RoLocks::new();
        let guard = locks.acquire("ro-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("ro-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_ros_do_not_contend() {
        let locks = RoLocks::new();
        let _first = locks.acquire("ro-1").await;

        let second = tokio::time::timeout(Duration::from_millis(200), locks.acquire("ro-2")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = RoLocks::new();
        drop(locks.acquire("ro-1").await);
        drop(locks.acquire("ro-2").await);

        let _held = locks.acquire("ro-3").await;
        assert_eq!(locks.len().await, 1);
    }
}
