//! Response bodies returned by the orchestrator.

use common::Status;
use serde::{Deserialize, Serialize};

/// Answer to an order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub external_token: String,
    pub status: Status,
    pub message: String,
}

/// Answer to a charge submission or a result poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub status: Status,
    pub transaction_id: String,
    pub message: String,
}

/// Answer to a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub status: Status,
    pub message: String,
}

/// Body returned for any failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: Status,
    pub message: String,
}

impl From<&crate::OrchestratorError> for ErrorResponse {
    fn from(err: &crate::OrchestratorError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_response_uses_camel_case() {
        let response = PaymentResponse {
            status: Status::Pending,
            transaction_id: "txn_0badf00d".to_string(),
            message: "Processing".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["transactionId"], "txn_0badf00d");
    }

    #[test]
    fn test_error_response_from_error() {
        let err = crate::OrchestratorError::OrderNotFound("ORD_9".to_string());
        let body = ErrorResponse::from(&err);
        assert_eq!(body.status, Status::NotFound);
        assert_eq!(body.message, "Order not found: ORD_9");
    }
}
