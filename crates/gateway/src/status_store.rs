use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use common::OrderToken;
use domain::PaymentStatus;
use tokio::time::Instant;

/// How long a settled token stays queryable by default.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Expired settled tokens are pruned on insert once the store grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: PaymentStatus,
    /// When the token reached a settled status; None while it is live.
    settled_at: Option<Instant>,
}

impl Entry {
    fn new(status: PaymentStatus, previous: Option<Entry>) -> Self {
        let settled_at = if status.is_settled() {
            previous
                .filter(|prev| prev.status == status)
                .and_then(|prev| prev.settled_at)
                .or_else(|| Some(Instant::now()))
        } else {
            None
        };
        Self { status, settled_at }
    }

    fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        self.settled_at
            .is_some_and(|at| now.saturating_duration_since(at) >= retention)
    }
}

/// The gateway's view of every order it knows, keyed by token.
///
/// A token missing from the store is reported as `NOT_FOUND`. Live tokens
/// (CREATED, PENDING) are kept until they settle. Settled tokens are kept for
/// the retention period, then dropped by [`StatusStore::prune_settled`] or
/// removed explicitly with [`StatusStore::remove`].
#[derive(Debug, Clone)]
pub struct StatusStore {
    entries: Arc<RwLock<HashMap<OrderToken, Entry>>>,
    retention: Duration,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn get(&self, token: &OrderToken) -> Option<PaymentStatus> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .map(|entry| entry.status)
    }

    /// Sets a status, returning the previous one.
    pub fn insert(&self, token: OrderToken, status: PaymentStatus) -> Option<PaymentStatus> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() > PRUNE_THRESHOLD {
            let now = Instant::now();
            entries.retain(|_, entry| !entry.is_expired(now, self.retention));
        }
        let previous = entries.get(&token).copied();
        entries.insert(token, Entry::new(status, previous));
        previous.map(|entry| entry.status)
    }

    /// Atomic read-modify-write of a single token.
    ///
    /// `f` sees the current status (None if unknown) and may change it;
    /// setting the slot to None removes the token.
    pub fn update<R>(
        &self,
        token: &OrderToken,
        f: impl FnOnce(&mut Option<PaymentStatus>) -> R,
    ) -> R {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.get(token).copied();
        let mut slot = previous.map(|entry| entry.status);
        let result = f(&mut slot);
        match slot {
            Some(status) => {
                entries.insert(token.clone(), Entry::new(status, previous));
            }
            None => {
                entries.remove(token);
            }
        }
        result
    }

    /// Forgets a token, returning its last status.
    pub fn remove(&self, token: &OrderToken) -> Option<PaymentStatus> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .map(|entry| entry.status)
    }

    /// Drops settled tokens older than the retention period.
    ///
    /// Returns how many tokens were removed.
    pub fn prune_settled(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.retention));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: &str) -> OrderToken {
        OrderToken::parse(raw).unwrap()
    }

    #[test]
    fn test_unknown_token() {
        let store = StatusStore::new();
        assert_eq!(store.get(&token("ORD_1")), None);
        assert!(store.is_empty());
        assert_eq!(store.retention(), DEFAULT_RETENTION);
    }

    #[test]
    fn test_insert_returns_previous() {
        let store = StatusStore::new();
        assert_eq!(store.insert(token("ORD_1"), PaymentStatus::Created), None);
        assert_eq!(
            store.insert(token("ORD_1"), PaymentStatus::Pending),
            Some(PaymentStatus::Created)
        );
        assert_eq!(store.get(&token("ORD_1")), Some(PaymentStatus::Pending));
    }

    #[test]
    fn test_update_conditionally() {
        let store = StatusStore::new();
        store.insert(token("ORD_2"), PaymentStatus::Canceled);

        let applied = store.update(&token("ORD_2"), |slot| {
            if *slot == Some(PaymentStatus::Pending) {
                *slot = Some(PaymentStatus::Success);
                true
            } else {
                false
            }
        });

        assert!(!applied);
        assert_eq!(store.get(&token("ORD_2")), Some(PaymentStatus::Canceled));
    }

    #[test]
    fn test_update_can_remove() {
        let store = StatusStore::new();
        store.insert(token("ORD_3"), PaymentStatus::Created);
        store.update(&token("ORD_3"), |slot| *slot = None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let store = StatusStore::new();
        let other = store.clone();
        store.insert(token("ORD_4"), PaymentStatus::Pending);
        assert_eq!(other.get(&token("ORD_4")), Some(PaymentStatus::Pending));
    }

    #[test]
    fn test_remove_forgets_the_token() {
        let store = StatusStore::new();
        store.insert(token("ORD_5"), PaymentStatus::Success);
        assert_eq!(store.remove(&token("ORD_5")), Some(PaymentStatus::Success));
        assert_eq!(store.get(&token("ORD_5")), None);
        assert_eq!(store.remove(&token("ORD_5")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_drops_only_expired_settled_tokens() {
        let store = StatusStore::with_retention(Duration::from_secs(60));
        store.insert(token("ORD_1"), PaymentStatus::Pending);
        store.insert(token("ORD_2"), PaymentStatus::Success);
        store.insert(token("ORD_3"), PaymentStatus::Created);

        tokio::time::advance(Duration::from_secs(30)).await;
        store.insert(token("ORD_4"), PaymentStatus::Canceled);
        assert_eq!(store.prune_settled(), 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.prune_settled(), 1);
        assert_eq!(store.get(&token("ORD_2")), None);
        assert_eq!(store.get(&token("ORD_4")), Some(PaymentStatus::Canceled));

        // Live tokens never expire.
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(store.prune_settled(), 1);
        assert_eq!(store.get(&token("ORD_1")), Some(PaymentStatus::Pending));
        assert_eq!(store.get(&token("ORD_3")), Some(PaymentStatus::Created));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settling_starts_the_retention_clock() {
        let store = StatusStore::with_retention(Duration::from_secs(60));
        store.insert(token("ORD_1"), PaymentStatus::Pending);

        tokio::time::advance(Duration::from_secs(120)).await;
        store.update(&token("ORD_1"), |slot| *slot = Some(PaymentStatus::Failed));
        assert_eq!(store.prune_settled(), 0);

        // Rewriting the same settled status keeps the original timestamp.
        tokio::time::advance(Duration::from_secs(40)).await;
        store.update(&token("ORD_1"), |slot| *slot = Some(PaymentStatus::Failed));
        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(store.prune_settled(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_prunes_past_threshold() {
        let store = StatusStore::with_retention(Duration::from_secs(1));
        for id in 1..=PRUNE_THRESHOLD + 1 {
            store.insert(token(&format!("ORD_{id}")), PaymentStatus::Success);
        }
        store.insert(token("ORD_9999"), PaymentStatus::Pending);
        assert_eq!(store.len(), PRUNE_THRESHOLD + 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        store.insert(token("ORD_10000"), PaymentStatus::Pending);
        assert_eq!(store.len(), 2);
    }
}
