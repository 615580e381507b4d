//! Error types for the sync engine.

use crate::remote::RemoteError;
use moneysync_protocol::ProtocolError;
use moneysync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a failure status.
    #[error("server rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Server message.
        message: String,
    },

    /// Local store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A record could not be mapped to or from the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connectivity was lost.
    #[error("not connected to server")]
    NotConnected,
}

impl SyncError {
    /// Returns true if this error means the network is unusable.
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::NotConnected)
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Rejected { status, message } => SyncError::Rejected { status, message },
            RemoteError::Transport(message) => SyncError::Transport(message),
        }
    }
}

/// Coarse result of one `sync_data()` run, surfaced to the scheduler.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Both phases ran; the last-sync time advanced.
    Success,
    /// No connectivity, or a transport failure escaped a phase.
    NetworkError,
    /// Any other failure escaped a phase.
    GenericError(SyncError),
}

impl SyncOutcome {
    /// Returns true for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success)
    }

    /// Classifies an error that escaped a phase.
    pub fn from_error(error: SyncError) -> Self {
        if error.is_network() {
            SyncOutcome::NetworkError
        } else {
            SyncOutcome::GenericError(error)
        }
    }
}
