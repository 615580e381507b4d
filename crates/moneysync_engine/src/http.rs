//! HTTP implementation of the remote client.
//!
//! The actual HTTP stack is abstracted via [`HttpClient`] so hosts can plug
//! in whatever library they already ship (reqwest, hyper, a platform
//! networking layer). Bodies are JSON.

use crate::clock::{Clock, SystemClock};
use crate::config::{RetryConfig, SyncConfig};
use crate::remote::{RemoteClient, RemoteError, RemoteResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moneysync_protocol::{
    Account, AccountDto, AccountUpdateRequest, Category, CategoryDto, HttpRequest, HttpResponse,
    Method, ProtocolResult, PullWindow, Transaction, TransactionDto, TransactionRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client abstraction.
///
/// `Err` means the request never produced a response (DNS, connect, reset).
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `request` to `base_url` and returns the response.
    async fn send(&self, base_url: &str, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// [`RemoteClient`] over an [`HttpClient`] with bounded retries.
pub struct HttpRemoteClient<C: HttpClient> {
    base_url: String,
    client: C,
    retry: RetryConfig,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl<C: HttpClient> HttpRemoteClient<C> {
    /// Creates a client using the URL, retry policy and timeout in `config`.
    pub fn new(config: &SyncConfig, client: C) -> Self {
        Self {
            base_url: config.base_url.clone(),
            client,
            retry: config.retry.clone(),
            timeout: config.request_timeout,
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses `clock` to stamp records received from the server.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Sends a request, retrying transport failures and 5xx responses.
    async fn execute(&self, request: HttpRequest) -> RemoteResult<HttpResponse> {
        let mut last_error = None;

        for attempt in 0..self.retry.max_attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }

            let sent =
                tokio::time::timeout(self.timeout, self.client.send(&self.base_url, &request));
            let error = match sent.await {
                Ok(Ok(response)) if response.is_success() => return Ok(response),
                Ok(Ok(response)) => RemoteError::Rejected {
                    status: response.status,
                    message: error_message(&response),
                },
                Ok(Err(e)) => RemoteError::Transport(e),
                Err(_) => RemoteError::Transport(format!("timed out after {:?}", self.timeout)),
            };

            if !error.is_transient() {
                return Err(error);
            }
            debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                error = %error,
                "request failed"
            );
            last_error = Some(error);
        }

        let error =
            last_error.unwrap_or_else(|| RemoteError::Transport("no attempts made".into()));
        warn!(
            method = %request.method,
            path = %request.path,
            attempts = self.retry.max_attempts,
            error = %error,
            "giving up on request"
        );
        Err(error)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: HttpRequest) -> RemoteResult<(u16, T)> {
        let response = self.execute(request).await?;
        let value = decode(&response)?;
        Ok((response.status, value))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: &B,
    ) -> RemoteResult<(u16, T)> {
        let body = serde_json::to_vec(body).map_err(|e| RemoteError::Rejected {
            status: 0,
            message: format!("failed to encode request: {}", e),
        })?;
        self.fetch(HttpRequest::new(method, path).with_body(body)).await
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> RemoteResult<T> {
    serde_json::from_slice(&response.body).map_err(|e| RemoteError::Rejected {
        status: response.status,
        message: format!("malformed response body: {}", e),
    })
}

fn convert<T>(status: u16, result: ProtocolResult<T>) -> RemoteResult<T> {
    result.map_err(|e| RemoteError::Rejected {
        status,
        message: format!("malformed response body: {}", e),
    })
}

fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| response.body_text())
}

#[async_trait]
impl<C: HttpClient> RemoteClient for HttpRemoteClient<C> {
    async fn list_accounts(&self) -> RemoteResult<Vec<Account>> {
        let (status, dtos): (u16, Vec<AccountDto>) =
            self.fetch(HttpRequest::new(Method::Get, "/accounts")).await?;
        let now = self.now();
        convert(
            status,
            dtos.into_iter().map(|dto| dto.into_model(now)).collect(),
        )
    }

    async fn update_account(&self, id: u64, account: &Account) -> RemoteResult<Account> {
        let (status, dto): (u16, AccountDto) = self
            .send_json(
                Method::Put,
                format!("/accounts/{}", id),
                &AccountUpdateRequest::from(account),
            )
            .await?;
        convert(status, dto.into_model(self.now()))
    }

    async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
        let (status, dtos): (u16, Vec<CategoryDto>) =
            self.fetch(HttpRequest::new(Method::Get, "/categories")).await?;
        convert(status, dtos.into_iter().map(Category::try_from).collect())
    }

    async fn create_transaction(&self, txn: &Transaction) -> RemoteResult<Transaction> {
        let (status, dto): (u16, TransactionDto) = self
            .send_json(
                Method::Post,
                "/transactions".to_string(),
                &TransactionRequest::from(txn),
            )
            .await?;
        convert(status, dto.into_model(self.now()))
    }

    async fn update_transaction(&self, id: u64, txn: &Transaction) -> RemoteResult<Transaction> {
        let (status, dto): (u16, TransactionDto) = self
            .send_json(
                Method::Put,
                format!("/transactions/{}", id),
                &TransactionRequest::from(txn),
            )
            .await?;
        convert(status, dto.into_model(self.now()))
    }

    async fn delete_transaction(&self, id: u64) -> RemoteResult<()> {
        self.execute(HttpRequest::new(
            Method::Delete,
            format!("/transactions/{}", id),
        ))
        .await?;
        Ok(())
    }

    async fn list_transactions_for_account(
        &self,
        account_id: u64,
        window: PullWindow,
    ) -> RemoteResult<Vec<Transaction>> {
        let request = HttpRequest::new(
            Method::Get,
            format!("/transactions/account/{}/period", account_id),
        )
        .with_query(window.query());
        let (status, dtos): (u16, Vec<TransactionDto>) = self.fetch(request).await?;
        let now = self.now();
        convert(
            status,
            dtos.into_iter().map(|dto| dto.into_model(now)).collect(),
        )
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a request. `Err` simulates a dropped connection.
    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// An HTTP client that routes requests directly to an in-process server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn send(&self, _base_url: &str, request: &HttpRequest) -> Result<HttpResponse, String> {
        self.server.handle(request)
    }
}
