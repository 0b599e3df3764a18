use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// One request/response exchange with the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Ledger-assigned identifier, increasing with insertion order.
    pub id: i64,
    pub order_id: OrderId,

    /// Transaction identifier reported by (or derived for) the gateway.
    pub transaction_id: String,
    pub amount: Money,
    pub status: PaymentStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Builds a stored record from an appended entry.
    pub fn from_new(id: i64, record: NewPaymentRecord) -> Self {
        Self {
            id,
            order_id: record.order_id,
            transaction_id: record.transaction_id,
            amount: record.amount,
            status: record.status,
            message: record.message,
            created_at: record.created_at,
            updated_at: record.created_at,
        }
    }

    /// Overwrites the status part of the record with a gateway resolution.
    pub fn apply(&mut self, resolution: &PaymentResolution) {
        self.status = resolution.status;
        self.message = resolution.message.clone();
        self.updated_at = resolution.updated_at;
    }

    /// Orders records so that the latest sorts last.
    pub fn recency_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// A record about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentRecord {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub amount: Money,
    pub status: PaymentStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NewPaymentRecord {
    pub fn new(
        order_id: OrderId,
        transaction_id: impl Into<String>,
        amount: Money,
        status: PaymentStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            transaction_id: transaction_id.into(),
            amount,
            status,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// The gateway's latest answer for an order, written onto its latest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResolution {
    pub status: PaymentStatus,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl PaymentResolution {
    pub fn new(status: PaymentStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            updated_at: Utc::now(),
        }
    }
}
