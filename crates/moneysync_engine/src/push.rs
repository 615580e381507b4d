//! Phase 1: push local changes upstream.
//!
//! Every record is pushed on its own; a failure is logged and the record
//! keeps its change flags for the next run. A server reply only clears the
//! flags if the local row did not change while the request was in flight.

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::events::SyncEvent;
use crate::remote::{RemoteClient, RemoteError};
use crate::state::PushReport;
use moneysync_protocol::{Account, EntityKind, ProtocolError, PushAction, RecordId, Transaction};
use moneysync_store::RecordStore;
use tracing::{debug, warn};

fn server_id(id: RecordId) -> SyncResult<u64> {
    id.server_id()
        .ok_or_else(|| SyncError::Protocol(ProtocolError::Unconfirmed(id.to_string())))
}

impl<R: RemoteClient, S: RecordStore> SyncEngine<R, S> {
    /// Pushes dirty accounts and dirty transactions concurrently and waits
    /// for both.
    pub(crate) async fn push_local_changes(&self) -> SyncResult<PushReport> {
        let (accounts, transactions) =
            tokio::join!(self.push_dirty_accounts(), self.push_dirty_transactions());

        let (accounts_pushed, accounts_failed) = accounts?;
        let mut report = transactions?;
        report.accounts_pushed = accounts_pushed;
        report.accounts_failed = accounts_failed;
        Ok(report)
    }

    async fn push_dirty_accounts(&self) -> SyncResult<(u64, u64)> {
        let dirty = self.store.dirty_accounts().await?;
        let (mut pushed, mut failed) = (0, 0);

        for account in &dirty {
            match self.push_account(account).await {
                Ok(()) => pushed += 1,
                Err(e) => {
                    warn!(account = %account.id, error = %e, "failed to push account");
                    failed += 1;
                }
            }
        }
        Ok((pushed, failed))
    }

    async fn push_account(&self, account: &Account) -> SyncResult<()> {
        let id = server_id(account.id)?;
        let confirmed = self.remote.update_account(id, account).await?;
        if self.store.confirm_account(account, confirmed).await? {
            debug!(account = id, "account pushed");
        } else {
            debug!(account = id, "account pushed, newer local edit left dirty");
        }
        Ok(())
    }

    async fn push_dirty_transactions(&self) -> SyncResult<PushReport> {
        let dirty = self.store.dirty_transactions().await?;
        let mut report = PushReport::default();

        for txn in &dirty {
            match self.push_transaction(txn).await {
                Ok(Some(PushAction::Delete)) => report.transactions_deleted += 1,
                Ok(Some(PushAction::DiscardLocal)) => report.transactions_discarded += 1,
                Ok(Some(PushAction::Create)) => report.transactions_created += 1,
                Ok(Some(PushAction::Update)) => report.transactions_updated += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(transaction = %txn.id, error = %e, "failed to push transaction");
                    report.transactions_failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn push_transaction(&self, txn: &Transaction) -> SyncResult<Option<PushAction>> {
        let Some(action) = txn.push_action() else {
            return Ok(None);
        };

        match action {
            PushAction::Delete => {
                let id = server_id(txn.id)?;
                match self.remote.delete_transaction(id).await {
                    Ok(()) => {}
                    // Already gone on the server: the delete has converged.
                    Err(RemoteError::Rejected { status: 404, .. }) => {
                        debug!(transaction = id, "transaction already deleted remotely");
                    }
                    Err(e) => return Err(e.into()),
                }
                self.store
                    .delete_by_key(EntityKind::Transaction, txn.id)
                    .await?;
            }
            PushAction::DiscardLocal => {
                self.store
                    .delete_by_key(EntityKind::Transaction, txn.id)
                    .await?;
            }
            PushAction::Create => {
                let created = self.remote.create_transaction(txn).await?;
                let confirmed = created.id;
                let clean = self.store.confirm_created(txn, created).await?;
                debug!(
                    placeholder = %txn.id,
                    confirmed = %confirmed,
                    clean,
                    "transaction re-keyed"
                );
                self.events.publish(SyncEvent::TransactionConfirmed {
                    placeholder: txn.id,
                    confirmed,
                });
            }
            PushAction::Update => {
                let id = server_id(txn.id)?;
                let updated = self.remote.update_transaction(id, txn).await?;
                if !self.store.confirm_transaction(txn, updated).await? {
                    debug!(transaction = id, "transaction pushed, newer local change left dirty");
                }
            }
        }
        Ok(Some(action))
    }
}
