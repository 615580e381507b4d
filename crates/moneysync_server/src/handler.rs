//! Request routing and handlers.

use crate::error::{ServerError, ServerResult};
use crate::ledger::Ledger;
use chrono::Utc;
use moneysync_protocol::{
    AccountDto, AccountUpdateRequest, HttpRequest, HttpResponse, Method, PullWindow,
    TransactionDto, TransactionRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

fn parse_id(entity: &'static str, raw: &str) -> ServerResult<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::InvalidRequest(format!("bad {} id: {}", entity, raw)))
}

fn body<T: DeserializeOwned>(request: &HttpRequest) -> ServerResult<T> {
    let bytes = request
        .body
        .as_deref()
        .ok_or_else(|| ServerError::InvalidRequest("missing body".into()))?;
    Ok(serde_json::from_slice(bytes)?)
}

fn json<T: Serialize>(status: u16, value: &T) -> ServerResult<HttpResponse> {
    let body = serde_json::to_vec(value).map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(HttpResponse::new(status, body))
}

/// Dispatches one request against the ledger.
pub(crate) fn route(ledger: &mut Ledger, request: &HttpRequest) -> ServerResult<HttpResponse> {
    let segments: Vec<&str> = request
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (request.method, segments.as_slice()) {
        (Method::Get, ["accounts"]) => json(200, &ledger.accounts()),
        (Method::Put, ["accounts", id]) => {
            update_account(ledger, parse_id("account", id)?, request)
        }
        (Method::Get, ["categories"]) => json(200, &ledger.categories()),
        (Method::Post, ["transactions"]) => create_transaction(ledger, request),
        (Method::Put, ["transactions", id]) => {
            update_transaction(ledger, parse_id("transaction", id)?, request)
        }
        (Method::Delete, ["transactions", id]) => {
            let id = parse_id("transaction", id)?;
            ledger
                .transactions
                .remove(&id)
                .ok_or(ServerError::NotFound {
                    entity: "transaction",
                    id,
                })?;
            Ok(HttpResponse::new(204, Vec::new()))
        }
        (Method::Get, ["transactions", "account", id, "period"]) => {
            let account_id = parse_id("account", id)?;
            if !ledger.accounts.contains_key(&account_id) {
                return Err(ServerError::NotFound {
                    entity: "account",
                    id: account_id,
                });
            }
            let window = PullWindow::from_query(&request.query)?;
            json(200, &ledger.transactions_in_window(account_id, &window))
        }
        _ => Err(ServerError::NoRoute(format!(
            "{} {}",
            request.method, request.path
        ))),
    }
}

fn update_account(
    ledger: &mut Ledger,
    id: u64,
    request: &HttpRequest,
) -> ServerResult<HttpResponse> {
    let update: AccountUpdateRequest = body(request)?;
    let account = ledger
        .accounts
        .get_mut(&id)
        .ok_or(ServerError::NotFound {
            entity: "account",
            id,
        })?;
    *account = AccountDto {
        id: id as i64,
        name: update.name,
        balance: update.balance,
        currency: update.currency,
        updated_at: Some(Utc::now()),
    };
    json(200, &*account)
}

fn check_account(ledger: &Ledger, req: &TransactionRequest) -> ServerResult<()> {
    let known = u64::try_from(req.account_id)
        .map(|id| ledger.accounts.contains_key(&id))
        .unwrap_or(false);
    if known {
        Ok(())
    } else {
        Err(ServerError::InvalidRequest(format!(
            "unknown account {}",
            req.account_id
        )))
    }
}

fn create_transaction(ledger: &mut Ledger, request: &HttpRequest) -> ServerResult<HttpResponse> {
    let req: TransactionRequest = body(request)?;
    check_account(ledger, &req)?;
    let id = ledger.allocate_id();
    let dto = TransactionDto {
        id: id as i64,
        account_id: req.account_id,
        category_id: req.category_id,
        amount: req.amount,
        comment: req.comment,
        transaction_date: req.transaction_date,
        updated_at: Some(Utc::now()),
    };
    ledger.transactions.insert(id, dto.clone());
    json(201, &dto)
}

fn update_transaction(
    ledger: &mut Ledger,
    id: u64,
    request: &HttpRequest,
) -> ServerResult<HttpResponse> {
    let req: TransactionRequest = body(request)?;
    check_account(ledger, &req)?;
    let txn = ledger
        .transactions
        .get_mut(&id)
        .ok_or(ServerError::NotFound {
            entity: "transaction",
            id,
        })?;
    *txn = TransactionDto {
        id: id as i64,
        account_id: req.account_id,
        category_id: req.category_id,
        amount: req.amount,
        comment: req.comment,
        transaction_date: req.transaction_date,
        updated_at: Some(Utc::now()),
    };
    json(200, &*txn)
}
