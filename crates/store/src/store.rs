use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{NewOrder, NewPaymentRecord, Order, PaymentRecord, PaymentResolution};

use crate::Result;

/// Persistence for order aggregates, keyed by internal id.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order in `Created` status and assigns its id.
    async fn insert(&self, draft: NewOrder) -> Result<Order>;

    /// Loads an order. Returns None if it doesn't exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Saves the mutable part of an order.
    ///
    /// Fails with `ConcurrencyConflict` if the stored version differs from
    /// `order.version()`. Returns the order with its new version.
    async fn save(&self, order: &Order) -> Result<Order>;
}

/// Append-mostly history of exchanges with the payment gateway.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Appends a record. Records are never deleted.
    async fn append(&self, record: NewPaymentRecord) -> Result<PaymentRecord>;

    /// Returns the most recent record for an order (latest `created_at`,
    /// ties broken by the higher id).
    async fn latest_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>>;

    /// Writes a gateway resolution onto an existing record in place.
    async fn resolve(
        &self,
        record_id: i64,
        resolution: &PaymentResolution,
    ) -> Result<PaymentRecord>;

    /// Returns every record for an order, oldest first.
    async fn history(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn insert(&self, draft: NewOrder) -> Result<Order> {
        (**self).insert(draft).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        (**self).get(order_id).await
    }

    async fn save(&self, order: &Order) -> Result<Order> {
        (**self).save(order).await
    }
}

#[async_trait]
impl<T: PaymentLedger + ?Sized> PaymentLedger for Arc<T> {
    async fn append(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        (**self).append(record).await
    }

    async fn latest_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        (**self).latest_for_order(order_id).await
    }

    async fn resolve(
        &self,
        record_id: i64,
        resolution: &PaymentResolution,
    ) -> Result<PaymentRecord> {
        (**self).resolve(record_id, resolution).await
    }

    async fn history(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        (**self).history(order_id).await
    }
}
