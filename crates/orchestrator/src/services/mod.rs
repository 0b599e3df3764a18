//! Collaborators the orchestrator consumes, with in-memory implementations.

pub mod cart;
pub mod catalog;
pub mod inventory;

pub use cart::{CartLine, CartProvider, InMemoryCart};
pub use catalog::{InMemoryCatalog, Product, ProductCatalog, StockLevel};
pub use inventory::InventoryLedger;
