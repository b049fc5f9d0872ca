//! Route handlers
//!
//! Every JSON body carries a `timestamp` (RFC 3339) next to its payload.

use crate::error::ApiError;
use crate::router::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use geo_consensus::{ChainReport, HealthStatus, TopologySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct Stamped<T> {
    #[serde(flatten)]
    pub body: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Stamped<T> {
    pub fn now(body: T) -> Json<Self> {
        Json(Self {
            body,
            timestamp: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TopologyBody {
    pub chains: BTreeMap<String, TopologySnapshot>,
}

#[derive(Debug, Serialize)]
pub struct ChainsBody {
    pub chains: Vec<ChainReport>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChainsQuery {
    pub id: Option<String>,
}

/// 200 while healthy, 503 once shutdown has begun.
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.api.health();
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Stamped::now(report)).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let metrics = state.api.aggregate_metrics()?;
    Ok(Stamped::now(metrics).into_response())
}

pub async fn topology(State(state): State<AppState>) -> Result<Response, ApiError> {
    let chains = state.api.topology()?;
    Ok(Stamped::now(TopologyBody { chains }).into_response())
}

/// All chains, or one with `?id=<chain>`.
pub async fn chains(
    State(state): State<AppState>,
    Query(query): Query<ChainsQuery>,
) -> Result<Response, ApiError> {
    let chains = state.api.chain_report(query.id.as_deref())?;
    Ok(Stamped::now(ChainsBody { chains }).into_response())
}

/// Default prometheus registry in text format.
#[cfg(feature = "metrics")]
pub async fn prometheus_metrics() -> Response {
    use axum::http::header::CONTENT_TYPE;
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => ([(CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
