//! Applies background charge outcomes to the status store.

use common::OrderToken;
use domain::PaymentStatus;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::StatusStore;

/// Outcome of a charge, published by its delay task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub token: OrderToken,
    pub status: PaymentStatus,
}

/// Writes a resolution if the token is still `PENDING`.
///
/// Returns whether the store changed. A token that was canceled (or
/// re-registered) in the meantime keeps its status.
pub fn apply(statuses: &StatusStore, resolution: &Resolution) -> bool {
    let applied = statuses.update(&resolution.token, |slot| {
        if *slot == Some(PaymentStatus::Pending) {
            *slot = Some(resolution.status);
            true
        } else {
            false
        }
    });

    if applied {
        metrics::counter!(
            "gateway_resolutions_total",
            "status" => resolution.status.as_str()
        )
        .increment(1);
        tracing::info!(token = %resolution.token, status = %resolution.status, "charge resolved");
    } else {
        tracing::debug!(
            token = %resolution.token,
            status = %resolution.status,
            "resolution dropped, token no longer pending"
        );
    }
    applied
}

/// Spawns the task that drains resolutions until every sender is dropped.
pub(crate) fn spawn(
    statuses: StatusStore,
    mut resolutions: mpsc::UnboundedReceiver<Resolution>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(resolution) = resolutions.recv().await {
            apply(&statuses, &resolution);
        }
        tracing::debug!("gateway resolver stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(status: PaymentStatus) -> Resolution {
        Resolution {
            token: OrderToken::parse("ORD_10").unwrap(),
            status,
        }
    }

    #[test]
    fn test_applies_to_pending() {
        let statuses = StatusStore::new();
        let res = resolution(PaymentStatus::Success);
        statuses.insert(res.token.clone(), PaymentStatus::Pending);

        assert!(apply(&statuses, &res));
        assert_eq!(statuses.get(&res.token), Some(PaymentStatus::Success));
    }

    #[test]
    fn test_late_resolution_keeps_canceled() {
        let statuses = StatusStore::new();
        let res = resolution(PaymentStatus::Success);
        statuses.insert(res.token.clone(), PaymentStatus::Canceled);

        assert!(!apply(&statuses, &res));
        assert_eq!(statuses.get(&res.token), Some(PaymentStatus::Canceled));
    }

    #[test]
    fn test_unknown_token_stays_unknown() {
        let statuses = StatusStore::new();
        let res = resolution(PaymentStatus::Failed);
        assert!(!apply(&statuses, &res));
        assert_eq!(statuses.get(&res.token), None);
    }

    #[tokio::test]
    async fn test_resolver_drains_channel() {
        let statuses = StatusStore::new();
        let res = resolution(PaymentStatus::Failed);
        statuses.insert(res.token.clone(), PaymentStatus::Pending);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn(statuses.clone(), rx);
        tx.send(res.clone()).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(statuses.get(&res.token), Some(PaymentStatus::Failed));
    }
}
