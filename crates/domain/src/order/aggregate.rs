//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderToken, UserId};
use serde::{Deserialize, Serialize};

use super::{NewOrder, OrderError, OrderLine, OrderStatus};

/// Mutable order state as persisted by an order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    pub token: Option<OrderToken>,
    pub status: OrderStatus,
    pub inventory_debited: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order aggregate root.
///
/// Lines and total are frozen at creation; afterwards the order only changes
/// through status transitions and inventory bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,

    /// Token registered with the payment gateway.
    token: Option<OrderToken>,

    lines: Vec<OrderLine>,
    total: Money,
    status: OrderStatus,

    /// True while a committed inventory debit exists for this order.
    inventory_debited: bool,

    /// Optimistic concurrency version, bumped by the store on every save.
    version: i64,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly inserted order in `Created` status.
    pub fn create(id: OrderId, draft: NewOrder, now: DateTime<Utc>) -> Self {
        let (user_id, lines, total) = draft.into_parts();
        Self {
            id,
            user_id,
            token: None,
            lines,
            total,
            status: OrderStatus::Created,
            inventory_debited: false,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds an order loaded from storage.
    pub fn rehydrate(id: OrderId, draft: NewOrder, state: PersistedState) -> Self {
        let (user_id, lines, total) = draft.into_parts();
        Self {
            id,
            user_id,
            token: state.token,
            lines,
            total,
            status: state.status,
            inventory_debited: state.inventory_debited,
            version: state.version,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn token(&self) -> Option<&OrderToken> {
        self.token.as_ref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the total frozen at creation.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn inventory_debited(&self) -> bool {
        self.inventory_debited
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the mutable part of the order for persistence.
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            token: self.token.clone(),
            status: self.status,
            inventory_debited: self.inventory_debited,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// Command methods
impl Order {
    /// Records the token the gateway registered for this order.
    pub fn assign_token(&mut self, token: OrderToken, now: DateTime<Utc>) -> Result<(), OrderError> {
        match &self.token {
            Some(existing) if *existing != token => Err(OrderError::TokenAlreadyAssigned {
                existing: existing.to_string(),
            }),
            _ => {
                self.token = Some(token);
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Moves the order to `Pending` once a charge was accepted.
    pub fn mark_pending(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status == OrderStatus::Pending {
            return Err(OrderError::PaymentInProgress);
        }
        self.transition(OrderStatus::Pending, now).map(|_| ())
    }

    /// Applies a status transition.
    ///
    /// Returns `Ok(false)` when the order already is in `next`.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<bool, OrderError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                action: action_name(next),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }

    /// Records that stock was debited for every line.
    pub fn record_debit(&mut self, now: DateTime<Utc>) {
        self.inventory_debited = true;
        self.updated_at = now;
    }

    /// Records that a previous debit was given back.
    pub fn record_restore(&mut self, now: DateTime<Utc>) {
        self.inventory_debited = false;
        self.updated_at = now;
    }

    /// Sets the version after a successful save.
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

fn action_name(next: OrderStatus) -> &'static str {
    match next {
        OrderStatus::Created => "reset",
        OrderStatus::Pending => "submit payment",
        OrderStatus::Success => "complete payment",
        OrderStatus::Failed => "fail payment",
        OrderStatus::Canceled => "cancel",
    }
}
