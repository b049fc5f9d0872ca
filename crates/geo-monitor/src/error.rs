//! Monitoring server errors and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use geo_consensus::QueryError;
use serde_json::json;
use std::net::SocketAddr;

/// Failures of the server itself. Both are fatal for the process.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to bind monitoring endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Monitoring server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// A failed query as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.to_string(),
            "timestamp": Utc::now(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(QueryError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(QueryError::Unavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
