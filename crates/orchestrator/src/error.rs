//! Orchestrator error types and their wire mapping.

use common::{MalformedToken, OrderId, ProductId, Status, UserId};
use domain::{OrderError, OrderStatus};
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by [`OrderOrchestrator`](crate::OrderOrchestrator) operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The user's cart has no items.
    #[error("Cart is empty for user {0}")]
    EmptyCart(UserId),

    /// A cart line references a product the catalog doesn't know.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds current stock (checked at order time).
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Stock ran out between order creation and payment success.
    #[error("Stock exhausted for product {product_id}: requested {requested}, available {available}")]
    StockExhausted {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order cannot be canceled in its current state.
    #[error("Order {token} cannot be canceled: {reason}")]
    CannotCancel { token: String, reason: String },

    /// The gateway rejected a request (unknown user, bad product list, ...).
    #[error("Payment gateway rejected request: {status} ({message})")]
    GatewayRejected { status: Status, message: String },

    /// The gateway answered with a status that makes no sense for the call.
    #[error("Unexpected {status} from payment gateway on {operation}")]
    UnexpectedGatewayStatus {
        operation: &'static str,
        status: Status,
    },

    /// The gateway reports a status the local order can no longer move to.
    #[error("Order {order_id} is {local} but payment gateway reports {remote}")]
    StatusDrift {
        order_id: OrderId,
        local: OrderStatus,
        remote: Status,
    },

    /// The order has no payment record to resolve.
    #[error("No payment record for order {0}")]
    MissingPaymentRecord(OrderId),

    /// A collaborator (cart, catalog) failed.
    #[error("{service} unavailable: {reason}")]
    Collaborator {
        service: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse error classes, used to pick a transport-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Gateway,
    Internal,
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::EmptyCart(_)
            | OrchestratorError::ProductNotFound(_)
            | OrchestratorError::InsufficientStock { .. }
            | OrchestratorError::MalformedToken(_)
            | OrchestratorError::GatewayRejected { .. } => ErrorKind::Validation,

            OrchestratorError::StockExhausted { .. }
            | OrchestratorError::CannotCancel { .. }
            | OrchestratorError::StatusDrift { .. } => ErrorKind::Conflict,

            OrchestratorError::Order(err) => match err {
                OrderError::NoLines
                | OrderError::InvalidQuantity { .. }
                | OrderError::QuantityTooLarge { .. }
                | OrderError::InvalidPrice { .. }
                | OrderError::TotalOverflow => ErrorKind::Validation,
                OrderError::InvalidStateTransition { .. }
                | OrderError::PaymentInProgress
                | OrderError::TokenAlreadyAssigned { .. } => ErrorKind::Conflict,
            },

            OrchestratorError::OrderNotFound(_) => ErrorKind::NotFound,

            OrchestratorError::Gateway(_) | OrchestratorError::UnexpectedGatewayStatus { .. } => {
                ErrorKind::Gateway
            }

            OrchestratorError::Store(err) => match err {
                StoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
                StoreError::OrderNotFound(_) => ErrorKind::NotFound,
                _ => ErrorKind::Internal,
            },

            OrchestratorError::MissingPaymentRecord(_) | OrchestratorError::Collaborator { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the wire status reported to clients for this error.
    pub fn status(&self) -> Status {
        match self {
            OrchestratorError::EmptyCart(_)
            | OrchestratorError::ProductNotFound(_)
            | OrchestratorError::InsufficientStock { .. } => Status::InvalidProductList,
            OrchestratorError::StockExhausted { .. } => Status::StockExhausted,
            OrchestratorError::MalformedToken(_) => Status::InvalidOrderId,
            OrchestratorError::OrderNotFound(_) => Status::NotFound,
            OrchestratorError::CannotCancel { .. } => Status::CannotCancel,
            OrchestratorError::GatewayRejected { status, .. } => *status,
            OrchestratorError::StatusDrift { .. } => Status::InvalidState,

            OrchestratorError::Order(err) => match err {
                OrderError::NoLines
                | OrderError::InvalidQuantity { .. }
                | OrderError::QuantityTooLarge { .. }
                | OrderError::InvalidPrice { .. }
                | OrderError::TotalOverflow => Status::InvalidProductList,
                OrderError::PaymentInProgress => Status::PaymentInProgress,
                OrderError::InvalidStateTransition { .. }
                | OrderError::TokenAlreadyAssigned { .. } => Status::InvalidState,
            },

            OrchestratorError::Store(err) => match err {
                StoreError::ConcurrencyConflict { .. } => Status::InvalidState,
                StoreError::OrderNotFound(_) => Status::NotFound,
                _ => Status::InternalError,
            },

            OrchestratorError::Gateway(_)
            | OrchestratorError::UnexpectedGatewayStatus { .. }
            | OrchestratorError::MissingPaymentRecord(_)
            | OrchestratorError::Collaborator { .. } => Status::InternalError,
        }
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors() {
        let err = OrchestratorError::EmptyCart(UserId::new(1));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Status::InvalidProductList);

        let err = OrchestratorError::InsufficientStock {
            product_id: ProductId::new(2),
            requested: 3,
            available: 2,
        };
        assert_eq!(err.status(), Status::InvalidProductList);
        assert!(err.to_string().contains("requested 3, available 2"));
    }

    #[test]
    fn test_gateway_rejection_keeps_its_status() {
        let err = OrchestratorError::GatewayRejected {
            status: Status::InvalidUser,
            message: "bad user".to_string(),
        };
        assert_eq!(err.status(), Status::InvalidUser);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_order_errors() {
        let err = OrchestratorError::from(OrderError::PaymentInProgress);
        assert_eq!(err.status(), Status::PaymentInProgress);
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = OrchestratorError::from(OrderError::InvalidStateTransition {
            current: OrderStatus::Success,
            action: "submit payment",
        });
        assert_eq!(err.status(), Status::InvalidState);
    }

    #[test]
    fn test_oversized_orders_are_validation_errors() {
        let err = OrchestratorError::from(OrderError::TotalOverflow);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Status::InvalidProductList);

        let err = OrchestratorError::from(OrderError::QuantityTooLarge {
            product_id: ProductId::new(1),
            quantity: u32::MAX,
            max: domain::MAX_LINE_QUANTITY,
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Status::InvalidProductList);
    }

    #[test]
    fn test_store_errors() {
        let conflict = OrchestratorError::from(StoreError::ConcurrencyConflict {
            order_id: OrderId::new(1),
            expected: 1,
            actual: 2,
        });
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let corrupted = OrchestratorError::from(StoreError::Corrupted("bad row".to_string()));
        assert_eq!(corrupted.kind(), ErrorKind::Internal);
        assert_eq!(corrupted.status(), Status::InternalError);
    }

    #[test]
    fn test_gateway_failures() {
        let err = OrchestratorError::from(GatewayError::Unavailable("down".to_string()));
        assert_eq!(err.kind(), ErrorKind::Gateway);
        assert_eq!(err.status(), Status::InternalError);

        let err = OrchestratorError::UnexpectedGatewayStatus {
            operation: "charge",
            status: Status::Success,
        };
        assert_eq!(err.kind(), ErrorKind::Gateway);
    }
}
