//! Per-order async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::OrderId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are pruned once the registry grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Serializes operations on the same order while letting different orders
/// proceed in parallel.
#[derive(Debug, Default)]
pub struct OrderLocks {
    locks: Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `order_id`.
    pub async fn acquire(&self, order_id: OrderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(order_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Returns how many orders currently have a lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_same_order_is_serialized() {
        let locks = Arc::new(OrderLocks::new());
        let guard = locks.acquire(OrderId::new(1)).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(OrderId::new(1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_orders_do_not_block() {
        let locks = OrderLocks::new();
        let _first = locks.acquire(OrderId::new(1)).await;
        let _second = locks.acquire(OrderId::new(2)).await;
        assert_eq!(locks.len(), 2);
    }
}
