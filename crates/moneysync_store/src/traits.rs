//! Store contracts consumed by the reconciler.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use moneysync_protocol::{Account, Category, EntityKind, RecordId, Transaction};

/// Keyed local storage for accounts, categories and transactions.
///
/// Implementations must tolerate concurrent readers and concurrent upserts
/// touching disjoint rows; each upsert is atomic per row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Accounts with unsynced local edits.
    async fn dirty_accounts(&self) -> StoreResult<Vec<Account>>;

    /// Transactions with unsynced local edits, including tombstones.
    async fn dirty_transactions(&self) -> StoreResult<Vec<Transaction>>;

    /// Inserts or replaces accounts by key.
    async fn upsert_accounts(&self, accounts: Vec<Account>) -> StoreResult<()>;

    /// Inserts or replaces categories by key.
    async fn upsert_categories(&self, categories: Vec<Category>) -> StoreResult<()>;

    /// Inserts or replaces transactions by key.
    async fn upsert_transactions(&self, transactions: Vec<Transaction>) -> StoreResult<()>;

    /// Writes the server's copy of a pushed account, clean, provided the
    /// local row has not changed since `pushed` was read.
    ///
    /// Returns false and leaves the local row dirty when a newer local edit
    /// exists.
    async fn confirm_account(&self, pushed: &Account, confirmed: Account) -> StoreResult<bool>;

    /// Like [`RecordStore::confirm_account`], for a transaction update.
    async fn confirm_transaction(
        &self,
        pushed: &Transaction,
        confirmed: Transaction,
    ) -> StoreResult<bool>;

    /// Re-keys a transaction created offline from its placeholder to the
    /// server-issued id, atomically.
    ///
    /// If the placeholder row changed after `pushed` was read, the newer row
    /// moves under the confirmed id with its change flags kept, and false is
    /// returned.
    async fn confirm_created(
        &self,
        pushed: &Transaction,
        confirmed: Transaction,
    ) -> StoreResult<bool>;

    /// Replaces the account table with a fresh server listing.
    ///
    /// Rows that are still dirty locally are kept as they are, so an edit
    /// whose push failed is retried rather than overwritten.
    async fn replace_accounts(&self, accounts: Vec<Account>) -> StoreResult<()>;

    /// Replaces the category table with a fresh server listing.
    async fn replace_categories(&self, categories: Vec<Category>) -> StoreResult<()>;

    /// Upserts pulled transactions, skipping keys whose local row still has
    /// unsynced changes.
    ///
    /// Returns the number of rows written.
    async fn upsert_remote_transactions(&self, transactions: Vec<Transaction>)
        -> StoreResult<usize>;

    /// Removes every row of a table.
    async fn clear(&self, kind: EntityKind) -> StoreResult<()>;

    /// Removes every clean row of a table, keeping rows with unsynced changes.
    ///
    /// Returns the number of rows removed.
    async fn clear_synced(&self, kind: EntityKind) -> StoreResult<usize>;

    /// Deletes a single row. Returns true if it existed.
    async fn delete_by_key(&self, kind: EntityKind, key: RecordId) -> StoreResult<bool>;

    /// All cached accounts, ordered by key.
    async fn all_accounts(&self) -> StoreResult<Vec<Account>>;

    /// All cached categories, ordered by key.
    async fn all_categories(&self) -> StoreResult<Vec<Category>>;

    /// Looks up one account.
    async fn get_account(&self, id: RecordId) -> StoreResult<Option<Account>>;

    /// Looks up one transaction.
    async fn get_transaction(&self, id: RecordId) -> StoreResult<Option<Transaction>>;

    /// Transactions of one account whose occurrence date falls in
    /// `from..=to`, ordered by occurrence time.
    async fn transactions_between(
        &self,
        account_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Transaction>>;
}

/// Durable session record.
#[async_trait]
pub trait SessionState: Send + Sync {
    /// Epoch milliseconds of the last successful sync, if any.
    async fn last_sync_time(&self) -> StoreResult<Option<i64>>;

    /// Records a successful sync.
    async fn set_last_sync_time(&self, epoch_millis: i64) -> StoreResult<()>;
}
