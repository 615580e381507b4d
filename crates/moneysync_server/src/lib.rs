//! # moneysync server
//!
//! Reference in-memory ledger server.
//!
//! This crate provides:
//! - The REST/JSON surface the sync engine consumes (accounts, categories,
//!   transactions, windowed transaction listings)
//! - Fault injection (server errors and dropped connections) per route
//! - A request log for asserting on client behavior
//!
//! The server is transport-agnostic: callers hand it an `HttpRequest` and
//! get back an `HttpResponse`, or a transport failure when a fault says the
//! connection should drop.
//!
//! ```
//! use moneysync_protocol::{HttpRequest, Method};
//! use moneysync_server::{LedgerServer, ServerConfig};
//!
//! let server = LedgerServer::new(ServerConfig::default());
//! let response = server.handle(&HttpRequest::new(Method::Get, "/accounts")).unwrap();
//! assert_eq!(response.status, 200);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod fault;
mod handler;
mod ledger;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use fault::{Fault, FaultKind};
pub use ledger::Ledger;
pub use server::{LedgerServer, RequestRecord};
