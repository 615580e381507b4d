//! The sync reconciler.

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncOutcome, SyncResult};
use crate::events::{SyncEvent, SyncEventBus, SyncEventSink};
use crate::remote::RemoteClient;
use crate::state::{SyncReport, SyncState, SyncStats};
use moneysync_store::{RecordStore, SessionState};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Reconciles the local record store with the ledger service.
///
/// Each run pushes local changes, then pulls canonical state. Runs are
/// serialized: a second caller waits for the first to finish.
///
/// # Example
///
/// ```rust,ignore
/// let engine = SyncEngine::new(config, remote, store, session, monitor)
///     .with_events(bus.clone());
///
/// match engine.sync_data().await {
///     SyncOutcome::Success => {}
///     SyncOutcome::NetworkError => show_offline_banner(),
///     SyncOutcome::GenericError(e) => show_sync_failed(&e),
/// }
/// ```
pub struct SyncEngine<R: RemoteClient, S: RecordStore> {
    pub(crate) config: SyncConfig,
    pub(crate) remote: R,
    pub(crate) store: Arc<S>,
    session: Arc<dyn SessionState>,
    connectivity: Arc<dyn Connectivity>,
    pub(crate) events: Arc<dyn SyncEventSink>,
    pub(crate) clock: Arc<dyn Clock>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    run_lock: Mutex<()>,
}

/// Resets the state to `Idle` if a run is dropped before it finishes.
struct ActiveRun<'a> {
    state: &'a RwLock<SyncState>,
    finished: bool,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.write() = SyncState::Idle;
        }
    }
}

impl<R: RemoteClient, S: RecordStore> SyncEngine<R, S> {
    /// Creates a new sync engine.
    pub fn new(
        config: SyncConfig,
        remote: R,
        store: Arc<S>,
        session: Arc<dyn SessionState>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            config,
            remote,
            store,
            session,
            connectivity,
            events: Arc::new(SyncEventBus::default()),
            clock: Arc::new(SystemClock),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            run_lock: Mutex::new(()),
        }
    }

    /// Publishes sync events to `events`.
    pub fn with_events(mut self, events: Arc<dyn SyncEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Uses `clock` for the last-sync time and the pull window.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the remote client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Gets the record store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Epoch milliseconds of the last successful run.
    pub async fn last_sync_time(&self) -> SyncResult<Option<i64>> {
        Ok(self.session.last_sync_time().await?)
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Runs one full reconciliation: push local changes, then pull.
    ///
    /// Waits for any run already in flight. Dropping the returned future
    /// cancels every in-flight request of this run.
    pub async fn sync_data(&self) -> SyncOutcome {
        let _guard = self.run_lock.lock().await;
        self.run().await
    }

    /// Like [`SyncEngine::sync_data`], but returns `None` instead of waiting
    /// when a run is already in flight.
    pub async fn try_sync_data(&self) -> Option<SyncOutcome> {
        let _guard = self.run_lock.try_lock().ok()?;
        Some(self.run().await)
    }

    async fn run(&self) -> SyncOutcome {
        if !self.connectivity.is_available() {
            return self.fail(SyncError::NotConnected);
        }

        let mut active = ActiveRun {
            state: &self.state,
            finished: false,
        };
        let started = Instant::now();
        let outcome = match self.run_phases().await {
            Ok(mut report) => {
                report.duration = started.elapsed();
                self.complete(report).await
            }
            Err(e) => self.fail(e),
        };
        active.finished = true;
        outcome
    }

    async fn run_phases(&self) -> SyncResult<SyncReport> {
        self.set_state(SyncState::Pushing);
        debug!("push phase started");
        let push = self.push_local_changes().await?;
        debug!(?push, "push phase finished");

        if !self.connectivity.is_available() {
            return Err(SyncError::NotConnected);
        }

        self.set_state(SyncState::Pulling);
        debug!("pull phase started");
        let pull = self.pull_remote_state().await?;
        debug!(?pull, "pull phase finished");

        Ok(SyncReport {
            push,
            pull,
            duration: Duration::ZERO,
        })
    }

    async fn complete(&self, report: SyncReport) -> SyncOutcome {
        let at = self.clock.now();
        if let Err(e) = self.session.set_last_sync_time(at.timestamp_millis()).await {
            return self.fail(e.into());
        }

        self.set_state(SyncState::Synced);
        info!(
            failed_records = report.push.failed(),
            transactions_pulled = report.pull.transactions_pulled,
            duration_ms = report.duration.as_millis() as u64,
            "sync completed"
        );
        {
            let mut stats = self.stats.write();
            stats.cycles_completed += 1;
            stats.last_sync_at = Some(at);
            stats.last_report = Some(report);
            stats.last_error = None;
        }
        self.events.publish(SyncEvent::Completed { at });
        SyncOutcome::Success
    }

    fn fail(&self, error: SyncError) -> SyncOutcome {
        let network = error.is_network();
        if network {
            info!(error = %error, "sync aborted: network unavailable");
        } else {
            warn!(error = %error, "sync failed");
        }

        self.set_state(SyncState::Error);
        {
            let mut stats = self.stats.write();
            stats.cycles_failed += 1;
            stats.last_error = Some(error.to_string());
        }
        self.events.publish(SyncEvent::Failed { network });
        SyncOutcome::from_error(error)
    }
}
