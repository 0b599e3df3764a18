//! Simulated external payment gateway.
//!
//! A charge is answered with `PENDING` right away. A spawned task waits a
//! random delay, picks an outcome and publishes it to the resolver, which
//! writes it into the gateway's [`StatusStore`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod outcome;
pub mod resolver;
pub mod status_store;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{CreateRequest, GatewayReply, MockPaymentGateway, PaymentGateway};
pub use outcome::{FixedOutcome, OutcomeSource, RandomOutcome};
pub use resolver::Resolution;
pub use status_store::{DEFAULT_RETENTION, StatusStore};
