//! # moneysync protocol
//!
//! Record identities, the synchronizable data model and the wire types
//! exchanged with the ledger service.
//!
//! This crate provides:
//! - `RecordId` for placeholder vs server-issued identities
//! - `Account`, `Category` and `Transaction` records with change flags
//! - JSON DTOs for the REST surface
//! - `PullWindow` for windowed transaction pulls
//! - Transport-neutral `HttpRequest` / `HttpResponse` envelopes
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod http;
mod id;
mod messages;
mod model;
mod window;

pub use error::{ProtocolError, ProtocolResult};
pub use http::{HttpRequest, HttpResponse, Method};
pub use id::RecordId;
pub use messages::{
    AccountDto, AccountUpdateRequest, CategoryDto, TransactionDto, TransactionRequest,
};
pub use model::{Account, Category, EntityKind, PushAction, Transaction};
pub use window::{PullWindow, WIRE_DATE_FORMAT};
