//! Shared harness for engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use moneysync_engine::{
    FixedClock, HttpRemoteClient, LoopbackClient, LoopbackServer, NetworkMonitor, RetryConfig,
    SyncConfig, SyncEngine, SyncEventBus,
};
use moneysync_protocol::{
    Account, AccountDto, CategoryDto, HttpRequest, HttpResponse, RecordId, Transaction,
    TransactionDto,
};
use moneysync_server::{LedgerServer, ServerConfig};
use moneysync_store::{MemorySessionState, MemoryStore, RecordStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

pub type Hook = Box<dyn Fn(&HttpRequest) + Send + Sync>;

/// Routes loopback requests to a shared server, optionally observing them.
pub struct ServerHandle {
    pub server: Arc<LedgerServer>,
    pub hook: Option<Hook>,
}

impl LoopbackServer for ServerHandle {
    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        if let Some(hook) = &self.hook {
            hook(request);
        }
        self.server.handle(request)
    }
}

pub type Remote = HttpRemoteClient<LoopbackClient<ServerHandle>>;

pub struct Harness {
    pub server: Arc<LedgerServer>,
    pub store: Arc<MemoryStore>,
    pub session: Arc<MemorySessionState>,
    pub monitor: Arc<NetworkMonitor>,
    pub clock: Arc<FixedClock>,
    pub bus: Arc<SyncEventBus>,
    pub engine: SyncEngine<Remote, MemoryStore>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap()
}

pub fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, 12, 0, 0).unwrap()
}

pub fn config() -> SyncConfig {
    SyncConfig::new("loopback://ledger")
        .with_retry(RetryConfig::new(3).with_delay(Duration::ZERO))
        .with_request_timeout(Duration::from_secs(5))
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            Arc::new(NetworkMonitor::new(true)),
            Arc::new(MemoryStore::new()),
            None,
        )
    }

    /// Runs `hook` against the local store before each request reaches
    /// the server, as if the user edited something mid-sync.
    pub fn with_store_hook(
        hook: impl Fn(&MemoryStore, &HttpRequest) + Send + Sync + 'static,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let local = Arc::clone(&store);
        let hook: Hook = Box::new(move |request: &HttpRequest| hook(&local, request));
        Self::build(Arc::new(NetworkMonitor::new(true)), store, Some(hook))
    }

    pub fn build(
        monitor: Arc<NetworkMonitor>,
        store: Arc<MemoryStore>,
        hook: Option<Hook>,
    ) -> Self {
        init_tracing();
        let server = Arc::new(LedgerServer::new(ServerConfig::default()));
        let session = Arc::new(MemorySessionState::new());
        let clock = Arc::new(FixedClock::new(now()));
        let bus = Arc::new(SyncEventBus::default());

        let remote = HttpRemoteClient::new(
            &config(),
            LoopbackClient::new(ServerHandle {
                server: Arc::clone(&server),
                hook,
            }),
        )
        .with_clock(clock.clone());

        let engine = SyncEngine::new(
            config(),
            remote,
            Arc::clone(&store),
            session.clone(),
            monitor.clone(),
        )
        .with_events(bus.clone())
        .with_clock(clock.clone());

        Self {
            server,
            store,
            session,
            monitor,
            clock,
            bus,
            engine,
        }
    }

    /// Seeds account 5 and two categories on the server.
    pub fn seed_server(&self) {
        self.server.seed_account(account_dto(5, "Checking", 80));
        self.server.seed_category(CategoryDto {
            id: 1,
            name: "Groceries".into(),
            emoji: Some("🛒".into()),
            is_income: false,
        });
        self.server.seed_category(CategoryDto {
            id: 2,
            name: "Salary".into(),
            emoji: None,
            is_income: true,
        });
    }

    /// Serializes the full store for equality checks.
    pub async fn snapshot(&self) -> String {
        let accounts = self.store.all_accounts().await.unwrap();
        let categories = self.store.all_categories().await.unwrap();
        let transactions = self.store.all_transactions();
        format!("{:?}\n{:?}\n{:?}", accounts, categories, transactions)
    }
}

pub fn account_dto(id: i64, name: &str, balance: i64) -> AccountDto {
    AccountDto {
        id,
        name: name.into(),
        balance: Decimal::new(balance, 0),
        currency: "USD".into(),
        updated_at: Some(now()),
    }
}

pub fn local_account(id: u64, name: &str, balance: i64, dirty: bool) -> Account {
    Account {
        id: RecordId::Confirmed(id),
        name: name.into(),
        balance: Decimal::new(balance, 0),
        currency: "USD".into(),
        dirty,
        modified_at: now(),
    }
}

pub fn transaction_dto(id: i64, account_id: i64, amount: i64, at: DateTime<Utc>) -> TransactionDto {
    TransactionDto {
        id,
        account_id,
        category_id: Some(1),
        amount: Decimal::new(amount, 0),
        comment: None,
        transaction_date: at,
        updated_at: Some(now()),
    }
}

/// The clean local copy of a server transaction.
pub fn cached(dto: &TransactionDto) -> Transaction {
    dto.clone().into_model(now()).unwrap()
}
