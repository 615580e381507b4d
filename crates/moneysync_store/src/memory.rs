//! In-memory record store.

use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use moneysync_protocol::{Account, Category, EntityKind, RecordId, Transaction};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) accounts: BTreeMap<RecordId, Account>,
    pub(crate) categories: BTreeMap<u64, Category>,
    pub(crate) transactions: BTreeMap<RecordId, Transaction>,
}

/// A thread-safe in-memory record store.
///
/// Suitable for tests and for hosts that persist the cache themselves. All
/// tables sit behind one `RwLock`, so every batch operation is atomic and
/// readers never observe a half-applied batch.
///
/// # Example
///
/// ```rust,ignore
/// use moneysync_store::{MemoryStore, RecordStore};
///
/// let store = MemoryStore::new();
/// store.upsert_accounts(vec![account]).await?;
/// assert_eq!(store.all_accounts().await?.len(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    pub(crate) tables: RwLock<Tables>,
    pub(crate) next_placeholder: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_placeholder: AtomicU64::new(1),
        }
    }

    /// Number of transactions currently cached, tombstones included.
    pub fn transaction_count(&self) -> usize {
        self.tables.read().transactions.len()
    }

    /// All cached transactions ordered by key.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.tables.read().transactions.values().cloned().collect()
    }

    pub(crate) fn next_placeholder_id(&self) -> RecordId {
        RecordId::Pending(self.next_placeholder.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn version(txn: &Transaction) -> (DateTime<Utc>, bool, bool) {
    (txn.modified_at, txn.dirty, txn.deleted)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn dirty_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .filter(|a| a.dirty)
            .cloned()
            .collect())
    }

    async fn dirty_transactions(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self
            .tables
            .read()
            .transactions
            .values()
            .filter(|t| t.needs_push())
            .cloned()
            .collect())
    }

    async fn upsert_accounts(&self, accounts: Vec<Account>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for account in accounts {
            tables.accounts.insert(account.id, account);
        }
        Ok(())
    }

    async fn upsert_categories(&self, categories: Vec<Category>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for category in categories {
            tables.categories.insert(category.id, category);
        }
        Ok(())
    }

    async fn upsert_transactions(&self, transactions: Vec<Transaction>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for txn in transactions {
            tables.transactions.insert(txn.id, txn);
        }
        Ok(())
    }

    async fn confirm_account(&self, pushed: &Account, mut confirmed: Account) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if let Some(local) = tables.accounts.get(&confirmed.id) {
            if (local.modified_at, local.dirty) != (pushed.modified_at, pushed.dirty) {
                debug!(id = %confirmed.id, "account changed during push, kept dirty");
                return Ok(false);
            }
        }
        confirmed.dirty = false;
        tables.accounts.insert(confirmed.id, confirmed);
        Ok(true)
    }

    async fn confirm_transaction(
        &self,
        pushed: &Transaction,
        mut confirmed: Transaction,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        if let Some(local) = tables.transactions.get(&confirmed.id) {
            if version(local) != version(pushed) {
                debug!(id = %confirmed.id, "transaction changed during push, kept dirty");
                return Ok(false);
            }
        }
        confirmed.dirty = false;
        confirmed.deleted = false;
        tables.transactions.insert(confirmed.id, confirmed);
        Ok(true)
    }

    async fn confirm_created(
        &self,
        pushed: &Transaction,
        mut confirmed: Transaction,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let placeholder = tables.transactions.remove(&pushed.id);
        match placeholder {
            Some(mut local) if version(&local) != version(pushed) => {
                debug!(
                    placeholder = %pushed.id,
                    confirmed = %confirmed.id,
                    "transaction changed during create, moved with its changes"
                );
                local.id = confirmed.id;
                tables.transactions.insert(local.id, local);
                Ok(false)
            }
            _ => {
                confirmed.dirty = false;
                confirmed.deleted = false;
                tables.transactions.insert(confirmed.id, confirmed);
                Ok(true)
            }
        }
    }

    async fn replace_accounts(&self, accounts: Vec<Account>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let mut fresh: BTreeMap<RecordId, Account> =
            accounts.into_iter().map(|a| (a.id, a)).collect();
        for (id, local) in tables.accounts.iter() {
            if local.dirty {
                fresh.insert(*id, local.clone());
            }
        }
        debug!(rows = fresh.len(), "replaced account table");
        tables.accounts = fresh;
        Ok(())
    }

    async fn replace_categories(&self, categories: Vec<Category>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.categories = categories.into_iter().map(|c| (c.id, c)).collect();
        debug!(rows = tables.categories.len(), "replaced category table");
        Ok(())
    }

    async fn upsert_remote_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let mut written = 0;
        for txn in transactions {
            let locally_changed = tables
                .transactions
                .get(&txn.id)
                .map(|local| local.needs_push())
                .unwrap_or(false);
            if locally_changed {
                debug!(id = %txn.id, "keeping local transaction with unsynced changes");
                continue;
            }
            tables.transactions.insert(txn.id, txn);
            written += 1;
        }
        Ok(written)
    }

    async fn clear(&self, kind: EntityKind) -> StoreResult<()> {
        let mut tables = self.tables.write();
        match kind {
            EntityKind::Account => tables.accounts.clear(),
            EntityKind::Category => tables.categories.clear(),
            EntityKind::Transaction => tables.transactions.clear(),
        }
        Ok(())
    }

    async fn clear_synced(&self, kind: EntityKind) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let removed = match kind {
            EntityKind::Account => {
                let before = tables.accounts.len();
                tables.accounts.retain(|_, a| a.dirty);
                before - tables.accounts.len()
            }
            EntityKind::Category => {
                let before = tables.categories.len();
                tables.categories.clear();
                before
            }
            EntityKind::Transaction => {
                let before = tables.transactions.len();
                tables.transactions.retain(|_, t| t.needs_push());
                before - tables.transactions.len()
            }
        };
        Ok(removed)
    }

    async fn delete_by_key(&self, kind: EntityKind, key: RecordId) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let existed = match kind {
            EntityKind::Account => tables.accounts.remove(&key).is_some(),
            EntityKind::Transaction => tables.transactions.remove(&key).is_some(),
            EntityKind::Category => match key.server_id() {
                Some(id) => tables.categories.remove(&id).is_some(),
                None => {
                    return Err(StoreError::Unsupported {
                        entity: kind,
                        reason: "categories only have server identities",
                    })
                }
            },
        };
        Ok(existed)
    }

    async fn all_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self.tables.read().accounts.values().cloned().collect())
    }

    async fn all_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.tables.read().categories.values().cloned().collect())
    }

    async fn get_account(&self, id: RecordId) -> StoreResult<Option<Account>> {
        Ok(self.tables.read().accounts.get(&id).cloned())
    }

    async fn get_transaction(&self, id: RecordId) -> StoreResult<Option<Transaction>> {
        Ok(self.tables.read().transactions.get(&id).cloned())
    }

    async fn transactions_between(
        &self,
        account_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .tables
            .read()
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .filter(|t| {
                let day = t.occurred_at.date_naive();
                from <= day && day <= to
            })
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.occurred_at);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn account(id: u64, dirty: bool) -> Account {
        Account {
            id: RecordId::Confirmed(id),
            name: format!("Account {}", id),
            balance: Decimal::new(100, 0),
            currency: "USD".into(),
            dirty,
            modified_at: Utc::now(),
        }
    }

    fn txn(id: RecordId, account_id: u64, day: u32, dirty: bool) -> Transaction {
        Transaction {
            id,
            account_id,
            category_id: None,
            amount: Decimal::new(-5, 0),
            comment: None,
            occurred_at: Utc.with_ymd_and_hms(2026, 9, day, 12, 0, 0).unwrap(),
            dirty,
            deleted: false,
            modified_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dirty_queries() {
        let store = MemoryStore::new();
        store
            .upsert_accounts(vec![account(1, true), account(2, false)])
            .await
            .unwrap();
        let mut tombstone = txn(RecordId::Confirmed(10), 1, 1, false);
        tombstone.deleted = true;
        store
            .upsert_transactions(vec![tombstone, txn(RecordId::Confirmed(11), 1, 2, false)])
            .await
            .unwrap();

        let dirty = store.dirty_accounts().await.unwrap();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].id, RecordId::Confirmed(1));

        let dirty = store.dirty_transactions().await.unwrap();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].id, RecordId::Confirmed(10));
    }

    #[tokio::test]
    async fn replace_accounts_keeps_dirty_rows() {
        let store = MemoryStore::new();
        let mut edited = account(1, true);
        edited.name = "Edited offline".into();
        store
            .upsert_accounts(vec![edited, account(2, false), account(3, false)])
            .await
            .unwrap();

        store
            .replace_accounts(vec![account(1, false), account(2, false)])
            .await
            .unwrap();

        let all = store.all_accounts().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Edited offline");
        assert!(all[0].dirty);
        assert!(store.get_account(RecordId::Confirmed(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_synced_keeps_pending_work() {
        let store = MemoryStore::new();
        store
            .upsert_transactions(vec![
                txn(RecordId::Confirmed(1), 1, 1, false),
                txn(RecordId::Confirmed(2), 1, 2, true),
                txn(RecordId::Pending(1), 1, 3, true),
            ])
            .await
            .unwrap();

        let removed = store.clear_synced(EntityKind::Transaction).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.transaction_count(), 2);

        store.clear(EntityKind::Transaction).await.unwrap();
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn remote_upsert_skips_locally_changed_rows() {
        let store = MemoryStore::new();
        let mut local = txn(RecordId::Confirmed(1), 1, 1, true);
        local.comment = Some("local".into());
        store.upsert_transactions(vec![local]).await.unwrap();

        let mut remote = txn(RecordId::Confirmed(1), 1, 1, false);
        remote.comment = Some("remote".into());
        let written = store
            .upsert_remote_transactions(vec![remote, txn(RecordId::Confirmed(2), 1, 2, false)])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let kept = store
            .get_transaction(RecordId::Confirmed(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.comment.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn range_query_is_inclusive_and_ordered() {
        let store = MemoryStore::new();
        store
            .upsert_transactions(vec![
                txn(RecordId::Confirmed(3), 1, 20, false),
                txn(RecordId::Confirmed(1), 1, 10, false),
                txn(RecordId::Confirmed(2), 2, 15, false),
                txn(RecordId::Confirmed(4), 1, 25, false),
            ])
            .await
            .unwrap();

        let from = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 9, 20).unwrap();
        let rows = store.transactions_between(1, from, to).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![RecordId::Confirmed(1), RecordId::Confirmed(3)]);
    }

    #[tokio::test]
    async fn delete_by_key() {
        let store = MemoryStore::new();
        store
            .upsert_transactions(vec![txn(RecordId::Pending(1), 1, 1, true)])
            .await
            .unwrap();
        assert!(store
            .delete_by_key(EntityKind::Transaction, RecordId::Pending(1))
            .await
            .unwrap());
        assert!(!store
            .delete_by_key(EntityKind::Transaction, RecordId::Pending(1))
            .await
            .unwrap());
        assert!(store
            .delete_by_key(EntityKind::Category, RecordId::Pending(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn confirm_clears_an_unchanged_row() {
        let store = MemoryStore::new();
        let pushed = txn(RecordId::Confirmed(7), 1, 3, true);
        store.upsert_transactions(vec![pushed.clone()]).await.unwrap();

        let mut server = pushed.clone();
        server.amount = Decimal::new(-6, 0);
        assert!(store.confirm_transaction(&pushed, server).await.unwrap());

        let row = store.get_transaction(pushed.id).await.unwrap().unwrap();
        assert!(!row.dirty);
        assert_eq!(row.amount, Decimal::new(-6, 0));
    }

    #[tokio::test]
    async fn confirm_keeps_a_row_tombstoned_in_flight() {
        let store = MemoryStore::new();
        let pushed = txn(RecordId::Confirmed(7), 1, 3, true);
        store.upsert_transactions(vec![pushed.clone()]).await.unwrap();
        store.tombstone_transaction(pushed.id).unwrap();

        assert!(!store.confirm_transaction(&pushed, pushed.clone()).await.unwrap());

        let row = store.get_transaction(pushed.id).await.unwrap().unwrap();
        assert!(row.deleted);
        assert!(row.dirty);
    }

    #[tokio::test]
    async fn confirm_keeps_an_account_edited_in_flight() {
        let store = MemoryStore::new();
        let pushed = account(5, true);
        store.upsert_accounts(vec![pushed.clone()]).await.unwrap();
        store
            .edit_account(
                pushed.id,
                crate::AccountEdit {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!store.confirm_account(&pushed, pushed.clone()).await.unwrap());

        let row = store.get_account(pushed.id).await.unwrap().unwrap();
        assert_eq!(row.name, "Renamed");
        assert!(row.dirty);
    }

    #[tokio::test]
    async fn created_row_is_rekeyed_with_newer_edits() {
        let store = MemoryStore::new();
        let pushed = txn(RecordId::Pending(1), 1, 3, true);
        store.upsert_transactions(vec![pushed.clone()]).await.unwrap();
        let mut edited = pushed.clone();
        edited.amount = Decimal::new(-99, 0);
        edited.modified_at = pushed.modified_at + chrono::TimeDelta::seconds(1);
        store.upsert_transactions(vec![edited]).await.unwrap();

        let mut server = pushed.clone();
        server.id = RecordId::Confirmed(2000);
        assert!(!store.confirm_created(&pushed, server).await.unwrap());

        assert!(store.get_transaction(pushed.id).await.unwrap().is_none());
        let row = store
            .get_transaction(RecordId::Confirmed(2000))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount, Decimal::new(-99, 0));
        assert!(row.dirty);
    }

    #[tokio::test]
    async fn created_row_is_rekeyed_clean_when_untouched() {
        let store = MemoryStore::new();
        let pushed = txn(RecordId::Pending(1), 1, 3, true);
        store.upsert_transactions(vec![pushed.clone()]).await.unwrap();

        let mut server = pushed.clone();
        server.id = RecordId::Confirmed(2000);
        assert!(store.confirm_created(&pushed, server).await.unwrap());

        let rows = store.dirty_transactions().await.unwrap();
        assert!(rows.is_empty());
        assert!(store
            .get_transaction(RecordId::Confirmed(2000))
            .await
            .unwrap()
            .is_some());
    }
}
