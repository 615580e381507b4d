//! The reference ledger server.

use crate::config::ServerConfig;
use crate::fault::{Fault, FaultKind};
use crate::handler::route;
use crate::ledger::Ledger;
use chrono::Utc;
use moneysync_protocol::{
    AccountDto, CategoryDto, HttpRequest, HttpResponse, Method, TransactionDto,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Method.
    pub method: Method,
    /// Path without query.
    pub path: String,
    /// Response status; `None` when the connection was dropped.
    pub status: Option<u16>,
}

/// An in-memory ledger server with fault injection.
///
/// # Example
///
/// ```
/// use moneysync_protocol::{HttpRequest, Method};
/// use moneysync_server::{Fault, LedgerServer, ServerConfig};
///
/// let server = LedgerServer::new(ServerConfig::default());
/// server.inject(Fault::status(Method::Get, "/accounts", 503).times(1));
///
/// let request = HttpRequest::new(Method::Get, "/accounts");
/// assert_eq!(server.handle(&request).unwrap().status, 503);
/// assert_eq!(server.handle(&request).unwrap().status, 200);
/// ```
pub struct LedgerServer {
    ledger: RwLock<Ledger>,
    faults: Mutex<Vec<Fault>>,
    log: Mutex<Vec<RequestRecord>>,
}

impl LedgerServer {
    /// Creates an empty server.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            ledger: RwLock::new(Ledger::new(config.first_id)),
            faults: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Handles a request.
    ///
    /// Returns `Err` when an injected fault drops the connection.
    pub fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        if let Some(kind) = self.take_fault(request) {
            return match kind {
                FaultKind::Drop => {
                    self.record(request, None);
                    debug!(method = %request.method, path = %request.path, "dropping connection");
                    Err("connection reset by peer".into())
                }
                FaultKind::Status(status) => {
                    self.record(request, Some(status));
                    Ok(error_response(status, "injected fault"))
                }
            };
        }

        let response = {
            let mut ledger = self.ledger.write();
            route(&mut ledger, request)
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => error_response(e.status(), &e.to_string()),
        };
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "handled request"
        );
        self.record(request, Some(response.status));
        Ok(response)
    }

    fn take_fault(&self, request: &HttpRequest) -> Option<FaultKind> {
        let mut faults = self.faults.lock();
        let kind = faults
            .iter_mut()
            .find(|f| f.matches(request))
            .and_then(|f| f.hit().then(|| f.kind()));
        faults.retain(|f| !f.is_spent());
        kind
    }

    fn record(&self, request: &HttpRequest, status: Option<u16>) {
        self.log.lock().push(RequestRecord {
            method: request.method,
            path: request.path.clone(),
            status,
        });
    }

    /// Arms a fault. Faults are checked in insertion order.
    pub fn inject(&self, fault: Fault) {
        self.faults.lock().push(fault);
    }

    /// Disarms all faults.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Adds or replaces an account. Rows without a modification time are
    /// stamped with the current time.
    pub fn seed_account(&self, mut account: AccountDto) {
        account.updated_at.get_or_insert_with(Utc::now);
        let mut ledger = self.ledger.write();
        let id = account.id.max(0) as u64;
        ledger.bump_past(id);
        ledger.accounts.insert(id, account);
    }

    /// Adds or replaces a category.
    pub fn seed_category(&self, category: CategoryDto) {
        let mut ledger = self.ledger.write();
        let id = category.id.max(0) as u64;
        ledger.bump_past(id);
        ledger.categories.insert(id, category);
    }

    /// Adds or replaces a transaction, stamped like [`LedgerServer::seed_account`].
    pub fn seed_transaction(&self, mut txn: TransactionDto) {
        txn.updated_at.get_or_insert_with(Utc::now);
        let mut ledger = self.ledger.write();
        let id = txn.id.max(0) as u64;
        ledger.bump_past(id);
        ledger.transactions.insert(id, txn);
    }

    /// Deletes a transaction as another device would.
    pub fn remove_transaction(&self, id: u64) -> Option<TransactionDto> {
        self.ledger.write().transactions.remove(&id)
    }

    /// Looks up an account.
    pub fn account(&self, id: u64) -> Option<AccountDto> {
        self.ledger.read().accounts.get(&id).cloned()
    }

    /// Looks up a transaction.
    pub fn transaction(&self, id: u64) -> Option<TransactionDto> {
        self.ledger.read().transactions.get(&id).cloned()
    }

    /// Returns a snapshot of the ledger.
    pub fn snapshot(&self) -> Ledger {
        self.ledger.read().clone()
    }

    /// All requests handled so far.
    pub fn requests(&self) -> Vec<RequestRecord> {
        self.log.lock().clone()
    }

    /// Number of requests handled so far.
    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Number of requests with this method and exact path.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Forgets the request log.
    pub fn reset_log(&self) {
        self.log.lock().clear();
    }
}

fn error_response(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string().into_bytes();
    HttpResponse::new(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use moneysync_protocol::{PullWindow, TransactionRequest};
    use rust_decimal::Decimal;

    fn server_with_account() -> LedgerServer {
        let server = LedgerServer::new(ServerConfig::default());
        server.seed_account(AccountDto {
            id: 5,
            name: "Checking".into(),
            balance: Decimal::new(100, 0),
            currency: "USD".into(),
            updated_at: None,
        });
        server
    }

    fn post_transaction(server: &LedgerServer, day: u32) -> TransactionDto {
        let req = TransactionRequest {
            account_id: 5,
            category_id: None,
            amount: Decimal::new(-20, 0),
            transaction_date: Utc.with_ymd_and_hms(2026, 9, day, 8, 0, 0).unwrap(),
            comment: Some("groceries".into()),
        };
        let request = HttpRequest::new(Method::Post, "/transactions")
            .with_body(serde_json::to_vec(&req).unwrap());
        let response = server.handle(&request).unwrap();
        assert_eq!(response.status, 201);
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let server = server_with_account();
        let a = post_transaction(&server, 1);
        let b = post_transaction(&server, 2);
        assert_eq!(a.id, 1000);
        assert_eq!(b.id, 1001);
        assert!(server.transaction(1000).is_some());
    }

    #[test]
    fn windowed_listing() {
        let server = server_with_account();
        post_transaction(&server, 1);
        post_transaction(&server, 20);

        let window = PullWindow::trailing(
            chrono::NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            3,
        )
        .unwrap();
        let request = HttpRequest::new(Method::Get, "/transactions/account/5/period")
            .with_query(window.query());
        let response = server.handle(&request).unwrap();
        let rows: Vec<TransactionDto> = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(rows.len(), 2);

        let narrow = PullWindow {
            start: chrono::NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
        };
        let request = HttpRequest::new(Method::Get, "/transactions/account/5/period")
            .with_query(narrow.query());
        let rows: Vec<TransactionDto> =
            serde_json::from_slice(&server.handle(&request).unwrap().body).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn delete_then_missing() {
        let server = server_with_account();
        let txn = post_transaction(&server, 1);
        let path = format!("/transactions/{}", txn.id);

        let response = server.handle(&HttpRequest::new(Method::Delete, &path)).unwrap();
        assert_eq!(response.status, 204);
        let response = server.handle(&HttpRequest::new(Method::Delete, &path)).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn unknown_route_and_account() {
        let server = server_with_account();
        let response = server
            .handle(&HttpRequest::new(Method::Get, "/budgets"))
            .unwrap();
        assert_eq!(response.status, 404);

        let response = server
            .handle(&HttpRequest::new(Method::Put, "/accounts/9").with_body(b"{}".to_vec()))
            .unwrap();
        assert_eq!(response.status, 400);
    }

    #[test]
    fn dropped_connections_are_logged() {
        let server = server_with_account();
        server.inject(Fault::drop_connection(Method::Get, "/categories").times(1));

        let request = HttpRequest::new(Method::Get, "/categories");
        assert!(server.handle(&request).is_err());
        assert!(server.handle(&request).is_ok());

        let log = server.requests();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].status, None);
        assert_eq!(log[1].status, Some(200));
        assert_eq!(server.count(Method::Get, "/categories"), 2);
    }
}
