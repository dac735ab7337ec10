//! Event ingress for the saga dispatcher.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{DomainEvent, IntegrationEvent};
use saga::DispatchOutcome;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub order_id: String,
    pub event_type: &'static str,
    pub outcome: &'static str,
    /// Saga state after the event. Absent when the event was ignored.
    pub state: Option<String>,
}

/// POST /events: delivers an integration event to the saga for its order.
#[tracing::instrument(skip(state, event), fields(event_type = event.event_type()))]
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(event): Json<IntegrationEvent>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let order_id = event.order_id();
    let event_type = event.event_type();

    let (outcome, saga_state) = match state.manager.dispatch(event.into()).await? {
        DispatchOutcome::Started(s) => ("started", Some(s)),
        DispatchOutcome::Applied(s) => ("applied", Some(s)),
        DispatchOutcome::Ended(s) => ("ended", Some(s)),
        DispatchOutcome::Ignored => ("ignored", None),
    };

    Ok(Json(DispatchResponse {
        order_id: order_id.to_string(),
        event_type,
        outcome,
        state: saga_state.map(|s| s.to_string()),
    }))
}
