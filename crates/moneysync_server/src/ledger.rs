//! Server-side records.

use moneysync_protocol::{AccountDto, CategoryDto, PullWindow, TransactionDto};
use std::collections::BTreeMap;

/// The authoritative record set held by the server.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) accounts: BTreeMap<u64, AccountDto>,
    pub(crate) categories: BTreeMap<u64, CategoryDto>,
    pub(crate) transactions: BTreeMap<u64, TransactionDto>,
    next_id: u64,
}

impl Ledger {
    /// Creates an empty ledger issuing ids from `first_id`.
    pub fn new(first_id: u64) -> Self {
        Self {
            accounts: BTreeMap::new(),
            categories: BTreeMap::new(),
            transactions: BTreeMap::new(),
            next_id: first_id,
        }
    }

    /// Allocates the next record id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Accounts ordered by id.
    pub fn accounts(&self) -> Vec<AccountDto> {
        self.accounts.values().cloned().collect()
    }

    /// Categories ordered by id.
    pub fn categories(&self) -> Vec<CategoryDto> {
        self.categories.values().cloned().collect()
    }

    /// All transactions ordered by id.
    pub fn transactions(&self) -> Vec<TransactionDto> {
        self.transactions.values().cloned().collect()
    }

    /// Transactions of one account inside `window`, ordered by date.
    pub fn transactions_in_window(
        &self,
        account_id: u64,
        window: &PullWindow,
    ) -> Vec<TransactionDto> {
        let mut rows: Vec<TransactionDto> = self
            .transactions
            .values()
            .filter(|t| t.account_id == account_id as i64)
            .filter(|t| window.contains(t.transaction_date.date_naive()))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.transaction_date);
        rows
    }

    pub(crate) fn bump_past(&mut self, id: u64) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }
}
