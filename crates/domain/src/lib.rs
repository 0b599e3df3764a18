//! Domain layer for the order-payment orchestrator.
//!
//! This crate provides:
//! - The `Order` aggregate with its `OrderStatus` state machine
//! - Frozen order lines and totals
//! - `PaymentStatus` and `PaymentRecord`, the payment ledger entries

pub mod order;
pub mod payment;

pub use order::{
    MAX_LINE_QUANTITY, NewOrder, Order, OrderError, OrderLine, OrderStatus, PersistedState,
};
pub use payment::{NewPaymentRecord, PaymentRecord, PaymentResolution, PaymentStatus};
