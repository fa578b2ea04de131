// src/error.rs

/// Errors reported by a search backend.
///
/// The federation layer never builds one of these on its own query or write
/// paths: every error a caller sees comes from a backend and is passed
/// through with its original kind.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connector is closed")]
    Closed,

    #[error("Other error: {0}")]
    Other(String),
}

impl ConnectorError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ConnectorError::Io(_) => "io_error",
            ConnectorError::SerdeJson(_) => "parse_error",
            ConnectorError::Backend(_) => "backend_error",
            ConnectorError::InvalidQuery(_) => "invalid_query",
            ConnectorError::Transport(_) => "upstream_error",
            ConnectorError::Timeout(_) => "timeout",
            ConnectorError::Closed => "closed",
            ConnectorError::Other(_) => "internal_error",
        }
    }

    /// Whether retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::Io(_) | ConnectorError::Transport(_) | ConnectorError::Timeout(_)
        )
    }
}
