//! Error types for the Fieldguide server.

use thiserror::Error;

use fieldguide_flow::FlowError;
use fieldguide_search::SearchError;
use fieldguide_store::StoreError;

/// Errors that can occur within the server.
///
/// Inner strings for `Unauthorized`, `Forbidden`, and `Conflict` carry the
/// full client-facing message; the API layer forwards them verbatim.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Requested resource not found. The inner string names the resource
    /// kind ("Article", "Flow", "Node", ...).
    #[error("{0} not found")]
    NotFound(String),

    /// Request failed validation (bad field, malformed graph, bad filter).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Authentication failure (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Permission failure (403).
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation (409).
    #[error("{0}")]
    Conflict(String),

    /// Rate limit exceeded (429).
    #[error("Rate limit exceeded for {resource} ({identifier}): {max_requests} requests per {window_ms}ms")]
    RateLimitExceeded {
        resource: String,
        identifier: String,
        max_requests: u32,
        window_ms: u64,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Knowledge store failure.
    #[error("Store error: {0}")]
    StoreError(String),

    /// Search index failure.
    #[error("Search index error: {0}")]
    SearchError(String),

    /// Anything else.
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ServerError {
    /// True for errors the client caused (4xx), false for server faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ServerError::ConfigurationError(_)
                | ServerError::StoreError(_)
                | ServerError::SearchError(_)
                | ServerError::InternalError(_)
        )
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServerError::NotFound(what),
            StoreError::Conflict(msg) => ServerError::Conflict(msg),
            other => ServerError::StoreError(other.to_string()),
        }
    }
}

impl From<SearchError> for ServerError {
    fn from(err: SearchError) -> Self {
        ServerError::SearchError(err.to_string())
    }
}

impl From<FlowError> for ServerError {
    // Graph validation failures surface with their own display text.
    fn from(err: FlowError) -> Self {
        ServerError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::InternalError(format!("Serialization error: {}", err))
    }
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
