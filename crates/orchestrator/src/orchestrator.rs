//! Order-payment lifecycle coordinator.

use chrono::Utc;
use common::{IdTranslator, OrderToken, Status, UserId};
use domain::{
    NewOrder, NewPaymentRecord, Order, OrderLine, OrderStatus, PaymentResolution, PaymentStatus,
};
use gateway::{CreateRequest, GatewayReply, PaymentGateway};
use store::{OrderStore, PaymentLedger};

use crate::error::{OrchestratorError, Result};
use crate::locks::OrderLocks;
use crate::response::{CancelResponse, CreateOrderResponse, PaymentResponse};
use crate::services::{CartProvider, InventoryLedger, ProductCatalog};

/// Drives orders from cart checkout through charge, polling and cancel.
///
/// The gateway is the authority on payment status: every operation writes
/// what the gateway reports into the order, the payment ledger and the
/// inventory. Operations on one order are serialized; different orders run
/// concurrently.
pub struct OrderOrchestrator<S, L, G, C, P>
where
    S: OrderStore,
    L: PaymentLedger,
    G: PaymentGateway,
    C: CartProvider,
    P: ProductCatalog,
{
    orders: S,
    ledger: L,
    gateway: G,
    carts: C,
    inventory: InventoryLedger<P>,
    locks: OrderLocks,
}

impl<S, L, G, C, P> OrderOrchestrator<S, L, G, C, P>
where
    S: OrderStore,
    L: PaymentLedger,
    G: PaymentGateway,
    C: CartProvider,
    P: ProductCatalog,
{
    pub fn new(orders: S, ledger: L, gateway: G, carts: C, catalog: P) -> Self {
        Self {
            orders,
            ledger,
            gateway,
            carts,
            inventory: InventoryLedger::new(catalog),
            locks: OrderLocks::new(),
        }
    }

    pub fn orders(&self) -> &S {
        &self.orders
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn inventory(&self) -> &InventoryLedger<P> {
        &self.inventory
    }

    /// Turns the user's cart into an order registered with the gateway.
    ///
    /// Stock is only checked here, never debited.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, user_id: UserId) -> Result<CreateOrderResponse> {
        let started = std::time::Instant::now();

        // 1. Snapshot the cart
        let cart = self.carts.cart_items(user_id).await?;
        if cart.is_empty() {
            return Err(OrchestratorError::EmptyCart(user_id));
        }

        // 2. Validate stock and freeze prices
        let mut lines = Vec::with_capacity(cart.len());
        for item in &cart {
            let product = self
                .inventory
                .reserve_check(item.product_id, item.quantity)
                .await?;
            lines.push(OrderLine::new(product.id, item.quantity, product.price));
        }
        let draft = NewOrder::new(user_id, lines)?;

        // 3. Persist in CREATED
        let mut order = self.orders.insert(draft).await?;
        let token = IdTranslator::to_token(order.id())?;

        // 4. Register with the gateway
        let request = CreateRequest {
            token: token.to_string(),
            user_id,
            lines: order.lines().to_vec(),
            amount: order.total(),
        };
        let reply = match self.gateway.create(request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.discard(&mut order).await;
                return Err(err.into());
            }
        };

        if reply.status != Status::Created {
            self.discard(&mut order).await;
            return Err(match reply.status {
                Status::InvalidUser | Status::InvalidProductList | Status::InvalidOrderId => {
                    OrchestratorError::GatewayRejected {
                        status: reply.status,
                        message: reply.message,
                    }
                }
                status => OrchestratorError::UnexpectedGatewayStatus {
                    operation: "create",
                    status,
                },
            });
        }

        order.assign_token(token.clone(), Utc::now())?;
        let order = self.orders.save(&order).await?;

        self.ledger
            .append(NewPaymentRecord::new(
                order.id(),
                token.as_str(),
                order.total(),
                PaymentStatus::Created,
                reply.message.clone(),
            ))
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_checkout_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id(), %token, total = %order.total(), "order created");

        Ok(CreateOrderResponse {
            external_token: token.to_string(),
            status: Status::Created,
            message: reply.message,
        })
    }

    /// Cancels locally an order the gateway refused to register.
    async fn discard(&self, order: &mut Order) {
        if order.transition(OrderStatus::Canceled, Utc::now()).is_ok()
            && let Err(err) = self.orders.save(order).await
        {
            tracing::warn!(
                order_id = %order.id(),
                error = %err,
                "failed to discard rejected order"
            );
        }
    }

    /// Submits a charge for the order's frozen total.
    ///
    /// Rejected with `PaymentInProgress` while a previous charge is pending.
    #[tracing::instrument(skip(self))]
    pub async fn submit_payment(&self, token: &str) -> Result<PaymentResponse> {
        let (token, order_id) = IdTranslator::resolve(token)?;
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(&token).await?;
        order.mark_pending(Utc::now())?;

        let reply = self.gateway.charge(token.as_str(), order.total()).await?;
        match reply.status {
            Status::Pending => {}
            Status::InvalidOrderId => {
                return Err(OrchestratorError::GatewayRejected {
                    status: reply.status,
                    message: reply.message,
                });
            }
            status => {
                return Err(OrchestratorError::UnexpectedGatewayStatus {
                    operation: "charge",
                    status,
                });
            }
        }
        let transaction_id = reply.transaction_id.ok_or(
            OrchestratorError::UnexpectedGatewayStatus {
                operation: "charge",
                status: Status::Pending,
            },
        )?;

        let order = self.orders.save(&order).await?;
        self.ledger
            .append(NewPaymentRecord::new(
                order.id(),
                transaction_id.clone(),
                order.total(),
                PaymentStatus::Pending,
                reply.message.clone(),
            ))
            .await?;

        metrics::counter!("payments_submitted_total").increment(1);
        tracing::info!(%order_id, %token, %transaction_id, "payment submitted");

        Ok(PaymentResponse {
            status: Status::Pending,
            transaction_id,
            message: reply.message,
        })
    }

    /// Pulls the gateway's current status and commits it locally.
    ///
    /// Side effects (debit, cart clear, restore) run only when the order's
    /// status actually changes, so repeated polls are harmless.
    #[tracing::instrument(skip(self))]
    pub async fn check_result(&self, token: &str) -> Result<PaymentResponse> {
        let (token, order_id) = IdTranslator::resolve(token)?;
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(&token).await?;
        let reply = self.gateway.result(token.as_str()).await?;
        let payment = reported_status("result", &token, &reply)?;

        let latest = self
            .ledger
            .latest_for_order(order_id)
            .await?
            .ok_or(OrchestratorError::MissingPaymentRecord(order_id))?;

        let target = payment.order_status();
        let current = order.status();

        if target != current {
            if !current.can_transition_to(target) {
                tracing::warn!(%order_id, local = %current, remote = %reply.status, "status drift");
                return Err(OrchestratorError::StatusDrift {
                    order_id,
                    local: current,
                    remote: reply.status,
                });
            }
            self.apply_transition(&mut order, target).await?;
        }

        let latest = if latest.status != payment {
            self.ledger
                .resolve(
                    latest.id,
                    &PaymentResolution::new(payment, reply.message.clone()),
                )
                .await?
        } else {
            latest
        };

        metrics::counter!("payment_results_total", "status" => reply.status.as_str())
            .increment(1);

        Ok(PaymentResponse {
            status: reply.status,
            transaction_id: latest.transaction_id,
            message: reply.message,
        })
    }

    /// Commits a status change together with its inventory and cart effects.
    async fn apply_transition(&self, order: &mut Order, target: OrderStatus) -> Result<()> {
        let now = Utc::now();
        let mut debited_now = false;

        match target {
            OrderStatus::Success => {
                self.inventory.debit_lines(order.lines()).await?;
                order.record_debit(now);
                debited_now = true;
            }
            OrderStatus::Failed | OrderStatus::Canceled if order.inventory_debited() => {
                self.inventory.restore_lines(order.lines()).await?;
                order.record_restore(now);
            }
            _ => {}
        }

        order.transition(target, now)?;
        match self.orders.save(order).await {
            Ok(saved) => *order = saved,
            Err(err) => {
                if debited_now
                    && let Err(rollback) = self.inventory.restore_lines(order.lines()).await
                {
                    tracing::error!(
                        order_id = %order.id(),
                        error = %rollback,
                        "failed to restore stock after save error"
                    );
                }
                return Err(err.into());
            }
        }

        if target == OrderStatus::Success
            && let Err(err) = self.carts.clear(order.user_id()).await
        {
            tracing::warn!(order_id = %order.id(), error = %err, "failed to clear cart");
        }

        tracing::info!(order_id = %order.id(), status = %target, "order status updated");
        Ok(())
    }

    /// Cancels an order that has not settled yet.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, token: &str) -> Result<CancelResponse> {
        let (token, order_id) = IdTranslator::resolve(token)?;
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(&token).await?;
        if !order.status().can_cancel() {
            return Err(OrchestratorError::CannotCancel {
                token: token.to_string(),
                reason: format!("order is {}", order.status()),
            });
        }

        let reply = self.gateway.cancel(token.as_str()).await?;
        match reply.status {
            Status::Canceled => {}
            Status::CannotCancel => {
                return Err(OrchestratorError::CannotCancel {
                    token: token.to_string(),
                    reason: reply.message,
                });
            }
            Status::NotFound => return Err(OrchestratorError::OrderNotFound(token.to_string())),
            status => {
                return Err(OrchestratorError::UnexpectedGatewayStatus {
                    operation: "cancel",
                    status,
                });
            }
        }

        let amount = self
            .ledger
            .latest_for_order(order_id)
            .await?
            .map(|record| record.amount)
            .unwrap_or(order.total());

        self.apply_transition(&mut order, OrderStatus::Canceled).await?;

        let transaction_id = format!("CANCEL-{}-{}", token, Utc::now().timestamp_millis());
        self.ledger
            .append(NewPaymentRecord::new(
                order_id,
                transaction_id,
                amount,
                PaymentStatus::Canceled,
                reply.message.clone(),
            ))
            .await?;

        metrics::counter!("orders_canceled_total").increment(1);
        tracing::info!(%order_id, %token, "order canceled");

        Ok(CancelResponse {
            status: Status::Canceled,
            message: reply.message,
        })
    }

    async fn load(&self, token: &OrderToken) -> Result<Order> {
        let order_id = IdTranslator::to_order_id(token);
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| OrchestratorError::OrderNotFound(token.to_string()))
    }
}

/// Maps a gateway status reply onto a payment status.
fn reported_status(
    operation: &'static str,
    token: &OrderToken,
    reply: &GatewayReply,
) -> Result<PaymentStatus> {
    match reply.status {
        Status::NotFound => Err(OrchestratorError::OrderNotFound(token.to_string())),
        status => PaymentStatus::from_wire(status)
            .ok_or(OrchestratorError::UnexpectedGatewayStatus { operation, status }),
    }
}
