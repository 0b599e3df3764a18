//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Status, UserId};
use gateway::PaymentGateway;
use orchestrator::{
    CancelResponse, CreateOrderResponse, InMemoryCart, InMemoryCatalog, OrderOrchestrator,
    PaymentResponse,
};
use store::{OrderStore, PaymentLedger};

use crate::error::ApiError;

/// Orchestrator wired with type-erased stores and gateway, so the same state
/// serves both the in-memory and the PostgreSQL setup.
pub type AppOrchestrator = OrderOrchestrator<
    Arc<dyn OrderStore>,
    Arc<dyn PaymentLedger>,
    Arc<dyn PaymentGateway>,
    InMemoryCart,
    InMemoryCatalog,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: AppOrchestrator,
    /// Handle on the carts the orchestrator reads from.
    pub carts: InMemoryCart,
    /// Handle on the catalog the orchestrator debits.
    pub catalog: InMemoryCatalog,
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(UserId::new)
        .map_err(|_| ApiError::bad_request(Status::InvalidUser, format!("Invalid user id: {raw}")))
}

/// POST /api/orders/{user_id}: check out the user's cart.
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let response = state.orchestrator.create_order(user_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/orders/{token}/payment: submit a charge.
#[tracing::instrument(skip(state))]
pub async fn submit_payment(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let response = state.orchestrator.submit_payment(&token).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /api/orders/{token}/payment/result: poll the gateway and sync.
#[tracing::instrument(skip(state))]
pub async fn payment_result(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    Ok(Json(state.orchestrator.check_result(&token).await?))
}

/// POST /api/orders/{token}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    Ok(Json(state.orchestrator.cancel_order(&token).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("42").unwrap(), UserId::new(42));
        assert_eq!(parse_user_id(" 7 ").unwrap(), UserId::new(7));

        let err = parse_user_id("alice").unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest {
                status: Status::InvalidUser,
                ..
            }
        ));
    }
}
