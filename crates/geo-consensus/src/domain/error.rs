//! Error types for the geo consensus layer

/// Errors raised by chain registration, creation and lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Node id 0 is reserved")]
    InvalidNodeId,

    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Period of the {task} task must be greater than zero")]
    InvalidSchedule { task: &'static str },

    #[error("Chain not found: {0}")]
    ChainNotFound(String),

    #[error("Chain already exists: {0}")]
    ChainAlreadyExists(String),

    #[error("Registry is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Errors surfaced by the underlying replicated-log chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Chain not started")]
    NotStarted,

    #[error("Chain halted")]
    Halted,

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Chain unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned to monitoring queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Chain {0} not found")]
    NotFound(String),

    #[error("Monitoring is unavailable during shutdown")]
    Unavailable,
}

/// Result type for geo consensus operations
pub type GeoResult<T> = Result<T, GeoError>;
