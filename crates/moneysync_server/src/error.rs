//! Error types for the reference server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors returned by request handlers.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown record.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Requested id.
        id: u64,
    },

    /// No route for the method and path.
    #[error("no route for {0}")]
    NoRoute(String),

    /// Injected or internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::NotFound { .. } | ServerError::NoRoute(_) => 404,
            ServerError::Internal(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::InvalidRequest(e.to_string())
    }
}

impl From<moneysync_protocol::ProtocolError> for ServerError {
    fn from(e: moneysync_protocol::ProtocolError) -> Self {
        ServerError::InvalidRequest(e.to_string())
    }
}
