//! Saga status endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SagaStatusResponse {
    pub order_id: String,
    pub state: String,
    pub compensating: bool,
    pub product_id: String,
    pub quantity: u32,
    pub user_id: String,
    pub payment_id: Option<String>,
    pub pending_deadline: Option<String>,
    pub compensation_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
}

/// GET /sagas/{order_id}: returns the saga of an order, active or ended.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<SagaStatusResponse>, ApiError> {
    let id = parse_order_id(&order_id)?;
    let saga = state
        .manager
        .saga_status(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Saga for order {order_id} not found")))?;

    Ok(Json(SagaStatusResponse {
        order_id: saga.order_id().to_string(),
        state: saga.state().to_string(),
        compensating: saga.state().is_compensating(),
        product_id: saga.product_id().to_string(),
        quantity: saga.quantity(),
        user_id: saga.user_id().to_string(),
        payment_id: saga.payment_id().map(|p| p.to_string()),
        pending_deadline: saga.pending_deadline().map(|d| d.to_string()),
        compensation_reason: saga.compensation_reason().map(String::from),
        rejection_reason: saga.rejection_reason().map(String::from),
        started_at: saga.started_at().to_rfc3339(),
        ended_at: saga.ended_at().map(|t| t.to_rfc3339()),
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(OrderId::from(uuid))
}
