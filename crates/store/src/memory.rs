use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use domain::{NewOrder, NewPaymentRecord, Order, PaymentRecord, PaymentResolution};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderStore, PaymentLedger},
};

#[derive(Default)]
struct OrderState {
    orders: HashMap<OrderId, Order>,
    last_id: i64,
}

/// In-memory order store for testing and local runs.
///
/// Provides the same optimistic concurrency semantics as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all orders. Ids keep increasing.
    pub async fn clear(&self) {
        self.state.write().await.orders.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, draft: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = OrderId::new(state.last_id);

        let order = Order::create(id, draft, Utc::now());
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn save(&self, order: &Order) -> Result<Order> {
        let mut state = self.state.write().await;
        let stored = state
            .orders
            .get_mut(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        let mut saved = order.clone();
        saved.set_version(order.version() + 1);
        *stored = saved.clone();
        Ok(saved)
    }
}

/// In-memory payment ledger for testing and local runs.
#[derive(Clone, Default)]
pub struct InMemoryPaymentLedger {
    records: Arc<RwLock<Vec<PaymentRecord>>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records across all orders.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn append(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let mut records = self.records.write().await;
        let id = records.len() as i64 + 1;
        let record = PaymentRecord::from_new(id, record);
        records.push(record.clone());
        Ok(record)
    }

    async fn latest_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.order_id == order_id)
            .max_by_key(|r| r.recency_key())
            .cloned())
    }

    async fn resolve(
        &self,
        record_id: i64,
        resolution: &PaymentResolution,
    ) -> Result<PaymentRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::PaymentRecordNotFound(record_id))?;
        record.apply(resolution);
        Ok(record.clone())
    }

    async fn history(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let records = self.records.read().await;
        let mut history: Vec<_> = records
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.recency_key());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, UserId};
    use domain::{OrderLine, OrderStatus, PaymentStatus};

    fn draft() -> NewOrder {
        NewOrder::new(
            UserId::new(1),
            vec![OrderLine::new(10, 2, Money::new(1_500))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryOrderStore::new();
        let first = store.insert(draft()).await.unwrap();
        let second = store.insert(draft()).await.unwrap();

        assert_eq!(first.id(), OrderId::new(1));
        assert_eq!(second.id(), OrderId::new(2));
        assert_eq!(first.status(), OrderStatus::Created);
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn test_get_missing_order() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = InMemoryOrderStore::new();
        let mut order = store.insert(draft()).await.unwrap();
        order.mark_pending(Utc::now()).unwrap();

        let saved = store.save(&order).await.unwrap();
        assert_eq!(saved.version(), 2);

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Pending);
        assert_eq!(loaded.version(), 2);
    }

    #[tokio::test]
    async fn test_save_with_stale_version_conflicts() {
        let store = InMemoryOrderStore::new();
        let order = store.insert(draft()).await.unwrap();
        let stale = order.clone();

        store.save(&order).await.unwrap();
        let result = store.save(&stale).await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_save_unknown_order() {
        let store = InMemoryOrderStore::new();
        let order = Order::create(OrderId::new(9), draft(), Utc::now());
        assert!(matches!(
            store.save(&order).await,
            Err(StoreError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_record_breaks_ties_by_id() {
        let ledger = InMemoryPaymentLedger::new();
        let order_id = OrderId::new(1);
        let mut first = NewPaymentRecord::new(
            order_id,
            "ORD_1",
            Money::new(3_000),
            PaymentStatus::Created,
            "",
        );
        let mut second = first.clone();
        second.transaction_id = "txn_0000beef".to_string();
        second.status = PaymentStatus::Pending;
        // Same timestamp on both.
        second.created_at = first.created_at;
        first.message = "registered".to_string();

        ledger.append(first).await.unwrap();
        ledger.append(second).await.unwrap();

        let latest = ledger.latest_for_order(order_id).await.unwrap().unwrap();
        assert_eq!(latest.transaction_id, "txn_0000beef");
        assert_eq!(ledger.history(order_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_updates_in_place() {
        let ledger = InMemoryPaymentLedger::new();
        let record = ledger
            .append(NewPaymentRecord::new(
                OrderId::new(5),
                "txn_12345678",
                Money::new(900),
                PaymentStatus::Pending,
                "",
            ))
            .await
            .unwrap();

        let resolved = ledger
            .resolve(
                record.id,
                &PaymentResolution::new(PaymentStatus::Success, "settled"),
            )
            .await
            .unwrap();

        assert_eq!(resolved.status, PaymentStatus::Success);
        assert_eq!(resolved.id, record.id);
        assert_eq!(ledger.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_missing_record() {
        let ledger = InMemoryPaymentLedger::new();
        let result = ledger
            .resolve(7, &PaymentResolution::new(PaymentStatus::Failed, ""))
            .await;
        assert!(matches!(result, Err(StoreError::PaymentRecordNotFound(7))));
    }
}
