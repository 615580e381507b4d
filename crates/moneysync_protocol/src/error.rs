//! Error types for protocol conversions.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while converting between wire and model types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The server reported an identity that cannot be a server key.
    #[error("invalid {entity} identity: {id}")]
    InvalidIdentity {
        /// Entity name.
        entity: &'static str,
        /// The offending id.
        id: i64,
    },

    /// A placeholder identity was about to be sent as a key.
    #[error("record {0} has no server identity yet")]
    Unconfirmed(String),

    /// The pull window cannot be built.
    #[error("invalid pull window: {0}")]
    InvalidWindow(String),
}
