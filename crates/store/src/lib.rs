//! Persistence for orders and the payment ledger.
//!
//! Both stores come in two flavours sharing one trait surface:
//! in-memory (tests, local runs) and PostgreSQL via sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryPaymentLedger};
pub use postgres::PostgresStore;
pub use store::{OrderStore, PaymentLedger};
