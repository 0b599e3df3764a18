use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store or ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was modified since it was loaded.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: i64,
        actual: i64,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The payment record does not exist.
    #[error("Payment record not found: {0}")]
    PaymentRecordNotFound(i64),

    /// A stored row could not be mapped back to the domain.
    #[error("Corrupted row: {0}")]
    Corrupted(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
