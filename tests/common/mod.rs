//! In-memory stand-ins for the terminal, the account catalog and the store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use tradesync::domain::{Account, Deal, DealEntry, DealType, Position, PositionKey};
use tradesync::terminal::LoginRequest;
use tradesync::{
    AccountCatalog, GracefulShutdown, PositionStore, Result, ShutdownSignal, SyncError,
    TerminalError, TradingTerminal,
};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn deal(
    ticket: u64,
    position_id: u64,
    secs: i64,
    deal_type: DealType,
    entry: DealEntry,
    price: Decimal,
) -> Deal {
    Deal {
        ticket,
        position_id,
        time: at(secs),
        symbol: "EURUSD".to_string(),
        deal_type,
        entry,
        price,
        volume: Decimal::ONE,
        profit: Decimal::ZERO,
        swap: Decimal::ZERO,
        commission: Decimal::ZERO,
    }
}

pub fn account(name: &str, login: i64, secret: Option<&str>, server: &str) -> Account {
    Account {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        terminal_login: Some(login),
        terminal_secret: secret.map(str::to_string),
        server: Some(server.to_string()),
    }
}

struct TerminalAccount {
    secret: String,
    server: String,
    deals: Vec<Deal>,
}

/// Terminal that knows a fixed set of accounts and logs every call
#[derive(Default)]
pub struct FakeTerminal {
    accounts: HashMap<i64, TerminalAccount>,
    current: Mutex<Option<i64>>,
    last_error: Mutex<Option<TerminalError>>,
    calls: Mutex<Vec<String>>,
    unreachable: bool,
}

impl FakeTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge process down: every call fails at the transport
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_account(mut self, login: i64, secret: &str, server: &str, deals: Vec<Deal>) -> Self {
        self.accounts.insert(
            login,
            TerminalAccount {
                secret: secret.to_string(),
                server: server.to_string(),
                deals,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.unreachable {
            return Err(SyncError::TerminalUnreachable("connection refused".to_string()));
        }
        Ok(())
    }

    fn authenticate(&self, request: &LoginRequest) -> bool {
        let outcome = match self.accounts.get(&request.login) {
            Some(acc) if acc.server != request.server => {
                Err(TerminalError::new(-1, "Terminal: Call failed"))
            }
            Some(acc) if acc.secret != request.secret.as_str() => {
                Err(TerminalError::new(-6, "Terminal: Authorization failed"))
            }
            Some(_) => Ok(()),
            None => Err(TerminalError::new(-6, "Terminal: Authorization failed")),
        };

        match outcome {
            Ok(()) => {
                *self.current.lock().unwrap() = Some(request.login);
                true
            }
            Err(e) => {
                *self.current.lock().unwrap() = None;
                *self.last_error.lock().unwrap() = Some(e);
                false
            }
        }
    }
}

#[async_trait]
impl TradingTerminal for FakeTerminal {
    async fn initialize(&self, _install_path: Option<String>) -> Result<bool> {
        self.record("initialize".to_string())?;
        Ok(true)
    }

    async fn initialize_with_login(
        &self,
        request: &LoginRequest,
        _install_path: Option<String>,
    ) -> Result<bool> {
        self.record(format!("initialize_with_login:{}@{}", request.login, request.server))?;
        Ok(self.authenticate(request))
    }

    async fn login(&self, request: &LoginRequest) -> Result<bool> {
        self.record(format!("login:{}@{}", request.login, request.server))?;
        Ok(self.authenticate(request))
    }

    async fn history_deals(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Option<Vec<Deal>>> {
        self.record("history_deals".to_string())?;
        let current = *self.current.lock().unwrap();
        Ok(current
            .and_then(|login| self.accounts.get(&login))
            .map(|acc| acc.deals.clone()))
    }

    async fn shutdown(&self) -> Result<()> {
        self.record("shutdown".to_string())?;
        *self.current.lock().unwrap() = None;
        Ok(())
    }

    async fn last_error(&self) -> Result<TerminalError> {
        self.record("last_error".to_string())?;
        Ok(self
            .last_error
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| TerminalError::new(1, "Success")))
    }
}

/// Catalog returning a fixed answer
pub struct MemoryCatalog {
    accounts: Option<Vec<Account>>,
}

impl MemoryCatalog {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Some(accounts),
        }
    }

    pub fn failing() -> Self {
        Self { accounts: None }
    }
}

#[async_trait]
impl AccountCatalog for MemoryCatalog {
    async fn fetch_accounts(&self) -> Result<Vec<Account>> {
        self.accounts
            .clone()
            .ok_or_else(|| SyncError::Validation("catalog unavailable".to_string()))
    }
}

/// Keyed position table with upsert semantics
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<PositionKey, Position>>,
    batches: Mutex<usize>,
    fail_for: Option<Uuid>,
    trip_on_write: Option<Arc<GracefulShutdown>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every batch for this account
    pub fn failing_for(account_id: Uuid) -> Self {
        Self {
            fail_for: Some(account_id),
            ..Self::default()
        }
    }

    /// Request shutdown as soon as the first batch is written
    pub fn tripping(shutdown: Arc<GracefulShutdown>) -> Self {
        Self {
            trip_on_write: Some(shutdown),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<Position> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn batches(&self) -> usize {
        *self.batches.lock().unwrap()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn upsert_positions(&self, positions: &[Position]) -> Result<usize> {
        if let Some(shutdown) = &self.trip_on_write {
            shutdown.request_shutdown(ShutdownSignal::Internal);
        }
        if positions.is_empty() {
            return Ok(0);
        }
        if positions.iter().any(|p| Some(p.account_id) == self.fail_for) {
            return Err(SyncError::Validation("store unavailable".to_string()));
        }

        *self.batches.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        for position in positions {
            rows.insert(position.key(), position.clone());
        }
        Ok(positions.len())
    }
}
