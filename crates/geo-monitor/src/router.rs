//! Router and middleware stack

use crate::handlers;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use geo_consensus::MonitoringApi;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn MonitoringApi>,
}

/// Build the monitoring router over `api`.
pub fn build_router(api: Arc<dyn MonitoringApi>) -> Router {
    let state = AppState { api };

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), record_request));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/topology", get(handlers::topology))
        .route("/chains", get(handlers::chains));

    #[cfg(feature = "metrics")]
    let router = router.route("/metrics/prometheus", get(handlers::prometheus_metrics));

    router.layer(middleware).with_state(state)
}

/// Count every response; anything outside 2xx is a failure.
async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    state
        .api
        .record_request(response.status().is_success(), started.elapsed());
    response
}
