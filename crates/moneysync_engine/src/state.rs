//! Engine state and run statistics.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine is idle, not syncing.
    Idle,
    /// Engine is pushing local changes.
    Pushing,
    /// Engine is pulling canonical state.
    Pulling,
    /// Engine has completed a sync run.
    Synced,
    /// The last run ended with an error.
    Error,
}

impl SyncState {
    /// Returns true if a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pushing | SyncState::Pulling)
    }
}

/// Per-record tallies of one push phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Account edits confirmed by the server.
    pub accounts_pushed: u64,
    /// Account edits that failed and stay dirty.
    pub accounts_failed: u64,
    /// Offline-created transactions now confirmed.
    pub transactions_created: u64,
    /// Transaction edits confirmed.
    pub transactions_updated: u64,
    /// Tombstones deleted on the server and purged locally.
    pub transactions_deleted: u64,
    /// Tombstoned placeholders dropped without a server call.
    pub transactions_discarded: u64,
    /// Transactions that failed and stay dirty or tombstoned.
    pub transactions_failed: u64,
}

impl PushReport {
    /// Records that failed and will be retried next run.
    pub fn failed(&self) -> u64 {
        self.accounts_failed + self.transactions_failed
    }
}

/// Tallies of one pull phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Accounts listed by the server.
    pub accounts: u64,
    /// Categories listed by the server.
    pub categories: u64,
    /// Clean transactions dropped before the windowed pull.
    pub stale_transactions_removed: u64,
    /// Account windows fetched.
    pub windows_pulled: u64,
    /// Account windows that failed and were skipped.
    pub windows_failed: u64,
    /// Transactions written from the pulled windows.
    pub transactions_pulled: u64,
}

/// Outcome details of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Push phase tallies.
    pub push: PushReport,
    /// Pull phase tallies.
    pub pull: PullReport,
    /// Wall time spent in both phases.
    pub duration: Duration,
}

/// Statistics about sync runs.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that returned `Success`.
    pub cycles_completed: u64,
    /// Runs that returned `NetworkError` or `GenericError`.
    pub cycles_failed: u64,
    /// Last recorded successful sync.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Report of the last successful run.
    pub last_report: Option<SyncReport>,
    /// Last error message.
    pub last_error: Option<String>,
}
