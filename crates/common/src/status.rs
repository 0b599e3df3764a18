//! Wire-level status vocabulary.
//!
//! Internal code works with closed enums per domain (`OrderStatus`,
//! `PaymentStatus`); this type only exists at the serialization boundary and
//! for gateway responses.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status string exchanged with callers and with the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Created,
    Pending,
    Success,
    Failed,
    Canceled,
    NotFound,
    InvalidOrderId,
    InvalidUser,
    InvalidProductList,
    CannotCancel,
    /// A charge is already in flight for the order.
    PaymentInProgress,
    /// The order is not in a state that allows the requested action.
    InvalidState,
    /// Stock ran out between order creation and payment success.
    StockExhausted,
    InternalError,
}

impl Status {
    pub const ALL: [Status; 14] = [
        Status::Created,
        Status::Pending,
        Status::Success,
        Status::Failed,
        Status::Canceled,
        Status::NotFound,
        Status::InvalidOrderId,
        Status::InvalidUser,
        Status::InvalidProductList,
        Status::CannotCancel,
        Status::PaymentInProgress,
        Status::InvalidState,
        Status::StockExhausted,
        Status::InternalError,
    ];

    /// Returns the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "CREATED",
            Status::Pending => "PENDING",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::Canceled => "CANCELED",
            Status::NotFound => "NOT_FOUND",
            Status::InvalidOrderId => "INVALID_ORDER_ID",
            Status::InvalidUser => "INVALID_USER",
            Status::InvalidProductList => "INVALID_PRODUCT_LIST",
            Status::CannotCancel => "CANNOT_CANCEL",
            Status::PaymentInProgress => "PAYMENT_IN_PROGRESS",
            Status::InvalidState => "INVALID_STATE",
            Status::StockExhausted => "STOCK_EXHAUSTED",
            Status::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns true for statuses describing a payment lifecycle position
    /// rather than a rejection.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Status::Created | Status::Pending | Status::Success | Status::Failed | Status::Canceled
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string outside the wire vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&Status::InvalidProductList).unwrap();
        assert_eq!(json, "\"INVALID_PRODUCT_LIST\"");

        let parsed: Status = serde_json::from_str("\"CANNOT_CANCEL\"").unwrap();
        assert_eq!(parsed, Status::CannotCancel);
    }

    #[test]
    fn display_matches_serde() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("success".parse::<Status>(), Ok(Status::Success));
        assert_eq!(" Pending ".parse::<Status>(), Ok(Status::Pending));
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "COMPLETED".parse::<Status>().unwrap_err();
        assert_eq!(err, UnknownStatus("COMPLETED".to_string()));
    }

    #[test]
    fn lifecycle_statuses() {
        assert!(Status::Pending.is_lifecycle());
        assert!(Status::Canceled.is_lifecycle());
        assert!(!Status::NotFound.is_lifecycle());
        assert!(!Status::CannotCancel.is_lifecycle());
    }
}
