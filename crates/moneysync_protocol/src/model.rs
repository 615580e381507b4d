//! Synchronizable records.

use crate::id::RecordId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// The three synchronizable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Bank accounts and wallets.
    Account,
    /// Server-owned income/expense categories.
    Category,
    /// Individual money movements.
    Transaction,
}

impl EntityKind {
    /// Returns the entity name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Category => "category",
            EntityKind::Transaction => "transaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An account as cached locally.
///
/// Accounts are edited locally but never created locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Identity.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
    /// ISO currency code (or the symbol the server uses).
    pub currency: String,
    /// Set by local edits, cleared after a confirmed round-trip.
    pub dirty: bool,
    /// Last local or remote modification.
    pub modified_at: DateTime<Utc>,
}

/// A category. Categories are reference data owned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Server identity.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Optional glyph shown next to the name.
    pub emoji: Option<String>,
    /// True for income, false for expense.
    pub is_income: bool,
}

/// A transaction as cached locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Identity; `Pending` while created offline and unacknowledged.
    pub id: RecordId,
    /// Server id of the owning account.
    pub account_id: u64,
    /// Optional category.
    pub category_id: Option<u64>,
    /// Signed amount.
    pub amount: Decimal,
    /// Free-form note.
    pub comment: Option<String>,
    /// When the money moved.
    pub occurred_at: DateTime<Utc>,
    /// Set by local edits, cleared after a confirmed round-trip.
    pub dirty: bool,
    /// Deleted while offline, not yet deleted on the server.
    pub deleted: bool,
    /// Last local or remote modification.
    pub modified_at: DateTime<Utc>,
}

/// What the reconciler has to send upstream for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    /// Tombstoned and known to the server: send a delete.
    Delete,
    /// Tombstoned but never acknowledged: drop the local row only.
    DiscardLocal,
    /// Created offline: send a create and re-key on success.
    Create,
    /// Edited offline: send an update.
    Update,
}

impl Transaction {
    /// Classifies the pending upstream work for this record.
    ///
    /// Returns `None` for clean records, which are never pushed.
    pub fn push_action(&self) -> Option<PushAction> {
        match (self.deleted, self.id) {
            (true, RecordId::Confirmed(_)) => Some(PushAction::Delete),
            (true, RecordId::Pending(_)) => Some(PushAction::DiscardLocal),
            (false, _) if !self.dirty => None,
            (false, RecordId::Pending(_)) => Some(PushAction::Create),
            (false, RecordId::Confirmed(_)) => Some(PushAction::Update),
        }
    }

    /// Returns true if the record carries unsynced local state.
    pub fn needs_push(&self) -> bool {
        self.dirty || self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: RecordId, dirty: bool, deleted: bool) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            category_id: None,
            amount: Decimal::new(-1250, 2),
            comment: None,
            occurred_at: Utc::now(),
            dirty,
            deleted,
            modified_at: Utc::now(),
        }
    }

    #[test]
    fn push_action_by_state() {
        assert_eq!(txn(RecordId::Confirmed(4), false, false).push_action(), None);
        assert_eq!(
            txn(RecordId::Confirmed(4), true, false).push_action(),
            Some(PushAction::Update)
        );
        assert_eq!(
            txn(RecordId::Pending(1), true, false).push_action(),
            Some(PushAction::Create)
        );
        assert_eq!(
            txn(RecordId::Confirmed(4), true, true).push_action(),
            Some(PushAction::Delete)
        );
        assert_eq!(
            txn(RecordId::Pending(1), true, true).push_action(),
            Some(PushAction::DiscardLocal)
        );
    }

    #[test]
    fn tombstone_wins_over_clean_flag() {
        // A tombstone is pushed even if the dirty flag was never raised.
        let t = txn(RecordId::Confirmed(9), false, true);
        assert!(t.needs_push());
        assert_eq!(t.push_action(), Some(PushAction::Delete));
    }
}
