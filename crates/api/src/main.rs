//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::config::Config;
use gateway::MockPaymentGateway;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryOrderStore, InMemoryPaymentLedger, OrderStore, PaymentLedger, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Picks PostgreSQL when a database URL is configured, in-memory otherwise.
async fn build_stores(config: &Config) -> (Arc<dyn OrderStore>, Arc<dyn PaymentLedger>) {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL stores");

            let store = Arc::new(store);
            let orders: Arc<dyn OrderStore> = store.clone();
            let ledger: Arc<dyn PaymentLedger> = store;
            (orders, ledger)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory stores");
            let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
            let ledger: Arc<dyn PaymentLedger> = Arc::new(InMemoryPaymentLedger::new());
            (orders, ledger)
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Stores, gateway and orchestrator
    let (orders, ledger) = build_stores(&config).await;
    let gateway = MockPaymentGateway::new(config.gateway_config());
    tracing::info!(gateway = ?gateway.config(), "payment gateway simulator ready");
    let state = api::create_state(orders, ledger, Arc::new(gateway));

    if config.seed_demo_data {
        api::seed_demo_data(&state);
    }

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
