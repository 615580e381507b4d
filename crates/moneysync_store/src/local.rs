//! Local mutations made outside the reconciler.
//!
//! These are the edits a UI performs while offline. Each one raises the
//! change flags so the next sync pushes it.

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use chrono::{DateTime, TimeDelta, Utc};
use moneysync_protocol::{Account, EntityKind, RecordId, Transaction};
use rust_decimal::Decimal;

/// Field changes for an account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountEdit {
    /// New display name.
    pub name: Option<String>,
    /// New balance.
    pub balance: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
}

/// User-entered transaction fields.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// Owning account (server id).
    pub account_id: u64,
    /// Optional category.
    pub category_id: Option<u64>,
    /// Amount.
    pub amount: Decimal,
    /// Optional note.
    pub comment: Option<String>,
    /// When the money moved.
    pub occurred_at: DateTime<Utc>,
}

/// A modification time strictly after `previous`, so every local change
/// yields a distinct version.
fn touched(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    previous
        .checked_add_signed(TimeDelta::nanoseconds(1))
        .map_or(now, |next| now.max(next))
}

impl MemoryStore {
    /// Applies an edit to a cached account and marks it dirty.
    pub fn edit_account(&self, id: RecordId, edit: AccountEdit) -> StoreResult<Account> {
        let mut tables = self.tables.write();
        let account = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Account,
            key: id,
        })?;
        if let Some(name) = edit.name {
            account.name = name;
        }
        if let Some(balance) = edit.balance {
            account.balance = balance;
        }
        if let Some(currency) = edit.currency {
            account.currency = currency;
        }
        account.dirty = true;
        account.modified_at = touched(account.modified_at);
        Ok(account.clone())
    }

    /// Records a transaction created offline under a fresh placeholder id.
    pub fn create_transaction(&self, draft: TransactionDraft) -> RecordId {
        let id = self.next_placeholder_id();
        let txn = Transaction {
            id,
            account_id: draft.account_id,
            category_id: draft.category_id,
            amount: draft.amount,
            comment: draft.comment,
            occurred_at: draft.occurred_at,
            dirty: true,
            deleted: false,
            modified_at: Utc::now(),
        };
        self.tables.write().transactions.insert(id, txn);
        id
    }

    /// Overwrites the user-editable fields of a transaction and marks it dirty.
    pub fn edit_transaction(&self, id: RecordId, draft: TransactionDraft) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let txn = tables
            .transactions
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Transaction,
                key: id,
            })?;
        if txn.deleted {
            return Err(StoreError::Tombstoned(id));
        }
        txn.account_id = draft.account_id;
        txn.category_id = draft.category_id;
        txn.amount = draft.amount;
        txn.comment = draft.comment;
        txn.occurred_at = draft.occurred_at;
        txn.dirty = true;
        txn.modified_at = touched(txn.modified_at);
        Ok(())
    }

    /// Marks a transaction as deleted locally.
    ///
    /// The row stays in the store until the server confirms the delete.
    pub fn tombstone_transaction(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let txn = tables
            .transactions
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Transaction,
                key: id,
            })?;
        txn.deleted = true;
        txn.dirty = true;
        txn.modified_at = touched(txn.modified_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RecordStore;

    fn draft(amount: i64) -> TransactionDraft {
        TransactionDraft {
            account_id: 5,
            category_id: Some(2),
            amount: Decimal::new(amount, 0),
            comment: None,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn created_transactions_get_distinct_placeholders() {
        let store = MemoryStore::new();
        let a = store.create_transaction(draft(-10));
        let b = store.create_transaction(draft(-20));

        assert_eq!(a, RecordId::Pending(1));
        assert_eq!(b, RecordId::Pending(2));
        assert_eq!(store.dirty_transactions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tombstone_keeps_row() {
        let store = MemoryStore::new();
        let id = store.create_transaction(draft(-10));
        store.tombstone_transaction(id).unwrap();

        let txn = store.get_transaction(id).await.unwrap().unwrap();
        assert!(txn.deleted);
        assert!(matches!(
            store.edit_transaction(id, draft(1)),
            Err(StoreError::Tombstoned(_))
        ));
    }

    #[tokio::test]
    async fn edit_account_marks_dirty() {
        let store = MemoryStore::new();
        store
            .upsert_accounts(vec![Account {
                id: RecordId::Confirmed(5),
                name: "Cash".into(),
                balance: Decimal::ZERO,
                currency: "USD".into(),
                dirty: false,
                modified_at: Utc::now(),
            }])
            .await
            .unwrap();

        let edited = store
            .edit_account(
                RecordId::Confirmed(5),
                AccountEdit {
                    balance: Some(Decimal::new(100, 0)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(edited.dirty);
        assert_eq!(edited.name, "Cash");
        assert_eq!(edited.balance, Decimal::new(100, 0));

        assert!(store
            .edit_account(RecordId::Confirmed(6), AccountEdit::default())
            .is_err());
    }
}
