//! # moneysync store
//!
//! The local side of synchronization: a keyed record store with change flags
//! and a durable session record holding the last successful sync time.
//!
//! This crate provides:
//! - `RecordStore`, the surface the reconciler reads and writes
//! - `SessionState`, the last-sync timestamp contract
//! - `MemoryStore`, a thread-safe in-memory implementation with the
//!   local-mutation helpers an editing UI uses
//! - `MemorySessionState` and the file-backed `FileSessionState`
//!
//! ## Change flags
//!
//! Any local mutation raises `dirty` (and `deleted` for tombstones). Only the
//! reconciler clears them, after the server confirmed the change.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod local;
mod memory;
mod session;
mod traits;

pub use error::{StoreError, StoreResult};
pub use local::{AccountEdit, TransactionDraft};
pub use memory::MemoryStore;
pub use session::{FileSessionState, MemorySessionState};
pub use traits::{RecordStore, SessionState};
