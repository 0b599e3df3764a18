//! Gateway error types.

use thiserror::Error;

/// Failures talking to the gateway itself.
///
/// Business rejections (unknown token, bad amount, ...) are not errors; they
/// come back as a [`GatewayReply`](crate::GatewayReply) with a rejection status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway could not be reached.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The resolver task is gone, so charges can no longer be settled.
    #[error("Payment gateway resolver has stopped")]
    ResolverStopped,
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
