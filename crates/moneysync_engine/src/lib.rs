//! # moneysync engine
//!
//! Offline-first sync reconciler for the moneysync ledger.
//!
//! This crate provides:
//! - `SyncEngine::sync_data`, the single entry point a scheduler calls
//! - Push-then-pull reconciliation with per-record failure isolation
//! - The `RemoteClient` contract and an HTTP/JSON implementation with
//!   bounded retries
//! - Connectivity, clock and notification seams
//!
//! ## Architecture
//!
//! The engine implements a **push-then-pull** model:
//! 1. Push dirty accounts and dirty/tombstoned transactions concurrently
//! 2. Wait for both to finish
//! 3. Refresh accounts and categories concurrently
//! 4. Drop clean cached transactions and re-pull each account's trailing
//!    window concurrently
//!
//! ## Key Invariants
//!
//! - Clean records are never pushed
//! - Placeholder ids never reach the server as keys
//! - Tombstones stay in the store until the server confirms the delete
//! - Nothing in the pull phase starts before the push phase has joined
//! - The last-sync time only advances on `SyncOutcome::Success`

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod clock;
mod config;
mod connectivity;
mod engine;
mod error;
mod events;
mod http;
mod pull;
mod push;
mod remote;
mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{RetryConfig, SyncConfig};
pub use connectivity::{Connectivity, NetworkMonitor};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncOutcome, SyncResult};
pub use events::{SyncEvent, SyncEventBus, SyncEventSink};
pub use http::{HttpClient, HttpRemoteClient, LoopbackClient, LoopbackServer};
pub use remote::{RemoteClient, RemoteError, RemoteResult};
pub use state::{PullReport, PushReport, SyncReport, SyncState, SyncStats};
