//! Operations host for the order saga.
//!
//! Accepts integration events over HTTP, exposes saga status, and
//! serves health and Prometheus metrics. Downstream services are
//! simulated in-process by [`simulation`].

pub mod config;
pub mod error;
pub mod routes;
pub mod simulation;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::IntegrationEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    DeadlineFired, InMemoryUpdateEmitter, OrderSaga, SagaConfig, SagaManager, TokioDeadlineManager,
};
use saga_store::InMemorySagaStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use simulation::{LoopbackCommandGateway, LoopbackQueryGateway};

/// The saga manager as wired by this host.
pub type AppManager = SagaManager<
    InMemorySagaStore,
    LoopbackCommandGateway,
    LoopbackQueryGateway,
    TokioDeadlineManager,
    InMemoryUpdateEmitter,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub manager: Arc<AppManager>,
    pub commands: LoopbackCommandGateway,
    pub deadlines: TokioDeadlineManager,
    pub updates: InMemoryUpdateEmitter,
}

/// Background loops that feed events back into the saga manager.
pub struct Workers {
    deadlines: mpsc::UnboundedReceiver<DeadlineFired>,
    events: mpsc::UnboundedReceiver<IntegrationEvent>,
}

impl Workers {
    /// Spawns the deadline loop and the loopback event pump.
    pub fn spawn(self, state: &AppState) -> Vec<JoinHandle<()>> {
        let manager = Arc::clone(&state.manager);
        let deadlines = self.deadlines;
        let deadline_loop = tokio::spawn(async move { manager.run_deadlines(deadlines).await });

        let pump = tokio::spawn(simulation::run_event_pump(
            Arc::clone(&state.manager),
            self.events,
        ));

        vec![deadline_loop, pump]
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(routes::metrics::MetricsState {
            handle: metrics_handle,
            app: Arc::clone(&state),
        });

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/events", post(routes::events::ingest))
        .route("/sagas/{order_id}", get(routes::sagas::get))
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

/// Creates the default application state with an in-memory store and
/// loopback services.
pub fn create_default_state(config: SagaConfig) -> (Arc<AppState>, Workers) {
    let (commands, events) = LoopbackCommandGateway::new();
    let (deadlines, fired) = TokioDeadlineManager::new();
    let updates = InMemoryUpdateEmitter::new();

    let saga = OrderSaga::new(
        commands.clone(),
        LoopbackQueryGateway,
        deadlines.clone(),
        updates.clone(),
        config,
    );
    let manager = Arc::new(SagaManager::new(InMemorySagaStore::new(), saga));

    let state = Arc::new(AppState {
        manager,
        commands,
        deadlines,
        updates,
    });
    let workers = Workers {
        deadlines: fired,
        events,
    };

    (state, workers)
}
