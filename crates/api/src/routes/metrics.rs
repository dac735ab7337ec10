//! Prometheus metrics endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use saga_store::SagaStore;

use crate::AppState;

/// State of the metrics route.
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub app: Arc<AppState>,
}

/// GET /metrics: returns Prometheus-formatted metrics.
///
/// Gauges for active sagas and outstanding deadlines are sampled on
/// each scrape.
pub async fn get(State(state): State<MetricsState>) -> impl IntoResponse {
    match state.app.manager.store().active_count().await {
        Ok(active) => metrics::gauge!("saga_active").set(active as f64),
        Err(e) => tracing::warn!(error = %e, "failed to count active sagas"),
    }
    metrics::gauge!("saga_deadlines_outstanding")
        .set(state.app.deadlines.outstanding_count() as f64);

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.handle.render(),
    )
}
