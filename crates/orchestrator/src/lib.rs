//! Order-payment lifecycle orchestration.
//!
//! [`OrderOrchestrator`] turns a cart into an order, submits it to the
//! payment gateway, polls the outcome and keeps orders, the payment ledger
//! and product inventory consistent with what the gateway reports.

pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod response;
pub mod services;

pub use error::{ErrorKind, OrchestratorError, Result};
pub use locks::OrderLocks;
pub use orchestrator::OrderOrchestrator;
pub use response::{CancelResponse, CreateOrderResponse, ErrorResponse, PaymentResponse};
pub use services::{
    CartLine, CartProvider, InMemoryCart, InMemoryCatalog, InventoryLedger, Product,
    ProductCatalog, StockLevel,
};
