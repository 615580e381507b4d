//! Error types for the local store.

use moneysync_protocol::{EntityKind, RecordId};
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Table searched.
        entity: EntityKind,
        /// Key that was not found.
        key: RecordId,
    },

    /// The operation does not apply to this table.
    #[error("operation not supported on {entity} table: {reason}")]
    Unsupported {
        /// Table.
        entity: EntityKind,
        /// Why it is unsupported.
        reason: &'static str,
    },

    /// The record was tombstoned and can no longer be edited.
    #[error("{0} is pending deletion")]
    Tombstoned(RecordId),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Persisted state could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
