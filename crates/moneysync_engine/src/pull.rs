//! Phase 2: pull canonical state.

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::remote::RemoteClient;
use crate::state::PullReport;
use futures::stream::{self, StreamExt};
use moneysync_protocol::{EntityKind, PullWindow};
use moneysync_store::RecordStore;
use tracing::{debug, warn};

impl<R: RemoteClient, S: RecordStore> SyncEngine<R, S> {
    /// Refreshes accounts and categories, then re-pulls every account's
    /// transaction window.
    ///
    /// Must only run after the push phase has joined: the transaction clear
    /// below is safe only once local edits have been uploaded.
    pub(crate) async fn pull_remote_state(&self) -> SyncResult<PullReport> {
        let window = PullWindow::trailing(self.clock.today(), self.config.pull_window_months)?;

        let (accounts, categories) =
            tokio::try_join!(self.refresh_accounts(), self.refresh_categories())?;
        let mut report = PullReport {
            accounts,
            categories,
            ..Default::default()
        };

        let account_ids: Vec<u64> = self
            .store
            .all_accounts()
            .await?
            .iter()
            .filter_map(|a| a.id.server_id())
            .collect();

        report.stale_transactions_removed =
            self.store.clear_synced(EntityKind::Transaction).await? as u64;

        let windows: Vec<Option<usize>> = stream::iter(account_ids)
            .map(|account_id| self.pull_account_window(account_id, window))
            .buffer_unordered(self.config.max_concurrent_pulls.max(1))
            .collect()
            .await;

        for pulled in windows {
            match pulled {
                Some(rows) => {
                    report.windows_pulled += 1;
                    report.transactions_pulled += rows as u64;
                }
                None => report.windows_failed += 1,
            }
        }
        Ok(report)
    }

    async fn refresh_accounts(&self) -> SyncResult<u64> {
        let mut accounts = self.remote.list_accounts().await?;
        for account in &mut accounts {
            account.dirty = false;
        }
        let count = accounts.len() as u64;
        self.store.replace_accounts(accounts).await?;
        Ok(count)
    }

    async fn refresh_categories(&self) -> SyncResult<u64> {
        let categories = self.remote.list_categories().await?;
        let count = categories.len() as u64;
        self.store.replace_categories(categories).await?;
        Ok(count)
    }

    /// Pulls one account's window. Failures are logged and reported as `None`.
    async fn pull_account_window(&self, account_id: u64, window: PullWindow) -> Option<usize> {
        match self.fetch_account_window(account_id, window).await {
            Ok(rows) => {
                debug!(account = account_id, rows, "pulled transaction window");
                Some(rows)
            }
            Err(e) => {
                warn!(account = account_id, error = %e, "failed to pull transaction window");
                None
            }
        }
    }

    async fn fetch_account_window(&self, account_id: u64, window: PullWindow) -> SyncResult<usize> {
        let mut transactions = self
            .remote
            .list_transactions_for_account(account_id, window)
            .await?;
        for txn in &mut transactions {
            txn.dirty = false;
            txn.deleted = false;
        }
        Ok(self.store.upsert_remote_transactions(transactions).await?)
    }
}
