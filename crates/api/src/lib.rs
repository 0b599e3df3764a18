//! HTTP API server for the order-payment orchestrator.
//!
//! Exposes checkout, payment submission, result polling and cancellation
//! as REST endpoints, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::{Money, UserId};
use gateway::{MockPaymentGateway, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{InMemoryCart, InMemoryCatalog, OrderOrchestrator, Product};
use store::{InMemoryOrderStore, InMemoryPaymentLedger, OrderStore, PaymentLedger};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/orders/{user_id}", post(routes::orders::create))
        .route(
            "/api/orders/{token}/payment",
            post(routes::orders::submit_payment),
        )
        .route(
            "/api/orders/{token}/payment/result",
            get(routes::orders::payment_result),
        )
        .route("/api/orders/{token}/cancel", post(routes::orders::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the orchestrator over the given stores and gateway, with in-memory
/// carts and catalog.
pub fn create_state(
    orders: Arc<dyn OrderStore>,
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
) -> Arc<AppState> {
    let carts = InMemoryCart::new();
    let catalog = InMemoryCatalog::new();
    let orchestrator =
        OrderOrchestrator::new(orders, ledger, gateway, carts.clone(), catalog.clone());

    Arc::new(AppState {
        orchestrator,
        carts,
        catalog,
    })
}

/// Creates the default application state: in-memory stores and a mock
/// gateway driven by `gateway`.
///
/// Must be called from within a tokio runtime, since the gateway spawns its
/// resolver task.
pub fn create_default_state(gateway: MockPaymentGateway) -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemoryPaymentLedger::new()),
        Arc::new(gateway),
    )
}

/// User whose cart [`seed_demo_data`] fills.
pub const DEMO_USER: UserId = UserId::new(1);

/// Populates a small catalog and a cart for [`DEMO_USER`].
pub fn seed_demo_data(state: &AppState) {
    state
        .catalog
        .add_product(Product::new(1, "Mechanical keyboard", Money::new(45_000), 10));
    state
        .catalog
        .add_product(Product::new(2, "USB-C cable", Money::new(3_000), 25));
    state
        .catalog
        .add_product(Product::new(3, "Monitor arm", Money::new(60_000), 2));

    state.carts.add_item(DEMO_USER, 1, 1);
    state.carts.add_item(DEMO_USER, 2, 2);
    tracing::info!(user_id = %DEMO_USER, "seeded demo catalog and cart");
}
