//! Shared types for the order-payment workspace.
//!
//! - Identifier newtypes for users, products and orders
//! - `Money` in minor currency units
//! - `OrderToken` and `IdTranslator` for the external identifier boundary
//! - `Status`, the wire-level status vocabulary

pub mod status;
pub mod token;
pub mod types;

pub use status::{Status, UnknownStatus};
pub use token::{IdTranslator, MalformedToken, OrderToken};
pub use types::{Money, OrderId, ProductId, UserId};
