//! Payment status and payment ledger records.

mod record;

pub use record::{NewPaymentRecord, PaymentRecord, PaymentResolution};

use common::Status;
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// Payment status as reported by the gateway and stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Pending,
    Success,
    Failed,
    Canceled,
}

impl PaymentStatus {
    /// Returns true once the gateway has settled the charge.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Canceled
        )
    }

    /// Returns the order status this payment status maps to.
    pub fn order_status(&self) -> OrderStatus {
        match self {
            PaymentStatus::Created => OrderStatus::Created,
            PaymentStatus::Pending => OrderStatus::Pending,
            PaymentStatus::Success => OrderStatus::Success,
            PaymentStatus::Failed => OrderStatus::Failed,
            PaymentStatus::Canceled => OrderStatus::Canceled,
        }
    }

    /// Returns the wire representation.
    pub fn to_wire(&self) -> Status {
        self.order_status().to_wire()
    }

    /// Maps a wire status; rejection statuses have no payment counterpart.
    pub fn from_wire(status: Status) -> Option<Self> {
        match status {
            Status::Created => Some(PaymentStatus::Created),
            Status::Pending => Some(PaymentStatus::Pending),
            Status::Success => Some(PaymentStatus::Success),
            Status::Failed => Some(PaymentStatus::Failed),
            Status::Canceled => Some(PaymentStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.to_wire().as_str()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_statuses() {
        assert!(!PaymentStatus::Created.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(PaymentStatus::Success.is_settled());
        assert!(PaymentStatus::Failed.is_settled());
        assert!(PaymentStatus::Canceled.is_settled());
    }

    #[test]
    fn test_wire_roundtrip() {
        for status in [
            PaymentStatus::Created,
            PaymentStatus::Pending,
            PaymentStatus::Success,
            PaymentStatus::Failed,
            PaymentStatus::Canceled,
        ] {
            assert_eq!(PaymentStatus::from_wire(status.to_wire()), Some(status));
        }
        assert_eq!(PaymentStatus::from_wire(Status::CannotCancel), None);
    }

    #[test]
    fn test_maps_to_order_status() {
        assert_eq!(
            PaymentStatus::Success.order_status(),
            OrderStatus::Success
        );
        assert_eq!(PaymentStatus::Pending.to_string(), "PENDING");
    }
}
