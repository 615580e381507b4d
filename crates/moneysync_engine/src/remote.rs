//! The remote ledger contract.

use async_trait::async_trait;
use moneysync_protocol::{Account, Category, PullWindow, Transaction};
use thiserror::Error;

/// Result of a remote operation.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure outcomes of a remote operation.
///
/// Together with `Ok` these form the tri-state outcome every remote call
/// returns: success with payload, rejected by the server, or transport
/// failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Server message or decoding failure.
        message: String,
    },

    /// The request did not complete (connection, timeout).
    #[error("transport failed: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Returns true if a retry may help: transport failures and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Rejected { status, .. } => *status >= 500,
            RemoteError::Transport(_) => true,
        }
    }
}

/// Typed operations against the ledger service.
///
/// Payloads are returned as clean model records. Implementations own their
/// transport-level retry policy; callers see only the final outcome.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Lists every account.
    async fn list_accounts(&self) -> RemoteResult<Vec<Account>>;

    /// Sends a local account edit; returns the server's copy.
    async fn update_account(&self, id: u64, account: &Account) -> RemoteResult<Account>;

    /// Lists every category.
    async fn list_categories(&self) -> RemoteResult<Vec<Category>>;

    /// Creates a transaction recorded offline; returns it with its server id.
    async fn create_transaction(&self, txn: &Transaction) -> RemoteResult<Transaction>;

    /// Sends a local transaction edit; returns the server's copy.
    async fn update_transaction(&self, id: u64, txn: &Transaction) -> RemoteResult<Transaction>;

    /// Deletes a transaction.
    async fn delete_transaction(&self, id: u64) -> RemoteResult<()>;

    /// Lists one account's transactions inside `window`.
    async fn list_transactions_for_account(
        &self,
        account_id: u64,
        window: PullWindow,
    ) -> RemoteResult<Vec<Transaction>>;
}
