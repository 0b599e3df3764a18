//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::{Order, PersistedState};
pub use state::OrderStatus;
pub use value_objects::{MAX_LINE_QUANTITY, NewOrder, OrderLine};

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no lines.
    #[error("Order has no lines")]
    NoLines,

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for product {product_id}: {price} (must be greater than 0)")]
    InvalidPrice { product_id: ProductId, price: i64 },

    /// A line quantity above what the order store can hold.
    #[error("Quantity {quantity} for product {product_id} exceeds the limit of {max}")]
    QuantityTooLarge {
        product_id: ProductId,
        quantity: u32,
        max: u32,
    },

    /// Line totals or their sum do not fit in a money amount.
    #[error("Order total overflows")]
    TotalOverflow,

    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current} state")]
    InvalidStateTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// A charge was already submitted and has not resolved yet.
    #[error("Payment already in progress")]
    PaymentInProgress,

    /// The order was already registered with the gateway under another token.
    #[error("Order already has external token {existing}")]
    TokenAlreadyAssigned { existing: String },
}
