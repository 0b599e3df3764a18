//! Payment gateway trait and the in-process simulator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Money, OrderToken, Status, UserId};
use domain::{OrderLine, PaymentStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    GatewayConfig, GatewayError, OutcomeSource, RandomOutcome, Resolution, Result, StatusStore,
    resolver,
};

/// Order registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Token the order will be known by at the gateway.
    pub token: String,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub amount: Money,
}

/// A gateway answer.
///
/// Rejections are replies too: their `status` carries the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReply {
    pub status: Status,
    pub transaction_id: Option<String>,
    pub message: String,
}

impl GatewayReply {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            transaction_id: None,
            message: message.into(),
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

/// Trait for the external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers an order. Answers `CREATED` with the token as transaction id.
    async fn create(&self, request: CreateRequest) -> Result<GatewayReply>;

    /// Starts a charge. Answers `PENDING` and resolves in the background.
    async fn charge(&self, token: &str, amount: Money) -> Result<GatewayReply>;

    /// Reports the current status for a token.
    async fn result(&self, token: &str) -> Result<GatewayReply>;

    /// Cancels an order unless its charge already failed.
    async fn cancel(&self, token: &str) -> Result<GatewayReply>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create(&self, request: CreateRequest) -> Result<GatewayReply> {
        (**self).create(request).await
    }

    async fn charge(&self, token: &str, amount: Money) -> Result<GatewayReply> {
        (**self).charge(token, amount).await
    }

    async fn result(&self, token: &str) -> Result<GatewayReply> {
        (**self).result(token).await
    }

    async fn cancel(&self, token: &str) -> Result<GatewayReply> {
        (**self).cancel(token).await
    }
}

/// In-process gateway simulator.
///
/// Must be constructed inside a tokio runtime; it spawns its resolver task.
#[derive(Clone)]
pub struct MockPaymentGateway {
    config: GatewayConfig,
    statuses: StatusStore,
    outcomes: Arc<dyn OutcomeSource>,
    resolutions: mpsc::UnboundedSender<Resolution>,
    unavailable: Arc<AtomicBool>,
}

impl MockPaymentGateway {
    /// Creates a gateway with random outcomes and its own status store.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_parts(config, StatusStore::new(), Arc::new(RandomOutcome))
    }

    /// Creates a gateway over an injected status store and outcome source.
    pub fn with_parts(
        config: GatewayConfig,
        statuses: StatusStore,
        outcomes: Arc<dyn OutcomeSource>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        resolver::spawn(statuses.clone(), rx);

        Self {
            config: config.normalized(),
            statuses,
            outcomes,
            resolutions: tx,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the store this gateway reports from.
    pub fn statuses(&self) -> &StatusStore {
        &self.statuses
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "simulated outage".to_string(),
            ));
        }
        Ok(())
    }

    fn schedule_resolution(&self, token: OrderToken) {
        let delay = self.outcomes.delay(&self.config);
        let outcomes = Arc::clone(&self.outcomes);
        let config = self.config.clone();
        let resolutions = self.resolutions.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let status = outcomes.outcome(&config);
            if resolutions.send(Resolution { token, status }).is_err() {
                tracing::warn!("gateway resolver gone, resolution lost");
            }
        });
    }
}

fn invalid_token(raw: &str) -> GatewayReply {
    GatewayReply::new(
        Status::InvalidOrderId,
        format!("Invalid order id: '{raw}'"),
    )
}

fn transaction_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("txn_{}", &id[..8])
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(token = %request.token))]
    async fn create(&self, request: CreateRequest) -> Result<GatewayReply> {
        self.ensure_available()?;

        if !request.user_id.is_valid() {
            return Ok(GatewayReply::new(
                Status::InvalidUser,
                format!("Invalid user id: {}", request.user_id),
            ));
        }
        if request.lines.is_empty() {
            return Ok(GatewayReply::new(
                Status::InvalidProductList,
                "Order must contain at least one product",
            ));
        }
        let Ok(token) = OrderToken::parse(&request.token) else {
            return Ok(invalid_token(&request.token));
        };

        self.statuses.insert(token.clone(), PaymentStatus::Created);

        let message = format!(
            "Order created successfully for userId={} with {} product(s). Total amount: {}",
            request.user_id,
            request.lines.len(),
            request.amount
        );
        Ok(GatewayReply::new(Status::Created, message).with_transaction_id(token.as_str()))
    }

    #[tracing::instrument(skip(self))]
    async fn charge(&self, token: &str, amount: Money) -> Result<GatewayReply> {
        self.ensure_available()?;

        let Ok(token) = OrderToken::parse(token) else {
            return Ok(invalid_token(token));
        };
        if self.resolutions.is_closed() {
            return Err(GatewayError::ResolverStopped);
        }

        metrics::counter!("gateway_charges_total").increment(1);
        let transaction_id = transaction_id();

        if !amount.is_positive() {
            self.statuses.insert(token.clone(), PaymentStatus::Failed);
            tracing::info!(%token, %amount, "charge rejected, amount must be positive");
            return Ok(GatewayReply::new(
                Status::Failed,
                format!("Payment for orderId={token} failed: amount must be positive"),
            )
            .with_transaction_id(transaction_id));
        }

        self.statuses.insert(token.clone(), PaymentStatus::Pending);
        self.schedule_resolution(token.clone());

        tracing::info!(%token, %transaction_id, "charge accepted");
        Ok(GatewayReply::new(
            Status::Pending,
            format!("Payment request for orderId={token} received. Processing..."),
        )
        .with_transaction_id(transaction_id))
    }

    #[tracing::instrument(skip(self))]
    async fn result(&self, token: &str) -> Result<GatewayReply> {
        self.ensure_available()?;

        let Ok(token) = OrderToken::parse(token) else {
            return Ok(invalid_token(token));
        };
        let status = self
            .statuses
            .get(&token)
            .map(|s| s.to_wire())
            .unwrap_or(Status::NotFound);

        Ok(GatewayReply::new(
            status,
            format!("Payment status for orderId={token} is {status}"),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, token: &str) -> Result<GatewayReply> {
        self.ensure_available()?;

        let Ok(token) = OrderToken::parse(token) else {
            return Ok(invalid_token(token));
        };

        let status = self.statuses.update(&token, |slot| match *slot {
            None => Status::NotFound,
            Some(PaymentStatus::Failed) => Status::CannotCancel,
            Some(_) => {
                *slot = Some(PaymentStatus::Canceled);
                Status::Canceled
            }
        });

        let message = match status {
            Status::Canceled => format!("Order canceled successfully for orderId={token}"),
            Status::CannotCancel => format!("Order {token} cannot be canceled: payment failed"),
            _ => format!("Order {token} not found"),
        };
        tracing::info!(%token, %status, "cancel processed");
        Ok(GatewayReply::new(status, message))
    }
}
