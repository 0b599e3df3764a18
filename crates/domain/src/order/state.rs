//! Order state machine.

use common::Status;
use serde::{Deserialize, Serialize};

/// The status of an order in its payment lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Pending ──┬──► Success
///    │           │      └──► Failed
///    └───────────┴──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order persisted and registered with the gateway, not charged yet.
    #[default]
    Created,

    /// Charge submitted, waiting for the gateway to resolve it.
    Pending,

    /// Payment confirmed and inventory debited (terminal state).
    Success,

    /// Payment declined (terminal state).
    Failed,

    /// Order canceled before completion (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if a charge can be submitted in this state.
    pub fn can_submit(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if a gateway outcome can settle the order in this state.
    pub fn can_resolve(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Success | OrderStatus::Failed | OrderStatus::Canceled
        )
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is not a transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match next {
            OrderStatus::Created => false,
            OrderStatus::Pending => self.can_submit(),
            OrderStatus::Success | OrderStatus::Failed => self.can_resolve(),
            OrderStatus::Canceled => self.can_cancel(),
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        self.to_wire().as_str()
    }

    /// Returns the wire representation.
    pub fn to_wire(&self) -> Status {
        match self {
            OrderStatus::Created => Status::Created,
            OrderStatus::Pending => Status::Pending,
            OrderStatus::Success => Status::Success,
            OrderStatus::Failed => Status::Failed,
            OrderStatus::Canceled => Status::Canceled,
        }
    }

    /// Parses the persisted/wire representation.
    pub fn from_wire(status: Status) -> Option<Self> {
        match status {
            Status::Created => Some(OrderStatus::Created),
            Status::Pending => Some(OrderStatus::Pending),
            Status::Success => Some(OrderStatus::Success),
            Status::Failed => Some(OrderStatus::Failed),
            Status::Canceled => Some(OrderStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
