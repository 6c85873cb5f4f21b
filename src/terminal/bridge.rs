//! HTTP bridge to the trading terminal
//!
//! The terminal only exposes a local IPC API, so a small bridge process runs
//! next to it and forwards JSON requests:
//! - `POST /initialize`, `POST /login`, `POST /shutdown` answer `{ok}`
//! - `POST /history_deals` answers `{deals: [...] | null}`
//! - `GET /last_error` answers `{code, message}`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{LoginRequest, TerminalError, TradingTerminal};
use crate::domain::{Deal, DealEntry, DealType};
use crate::error::{Result, SyncError};

/// Terminal client that goes through the HTTP bridge
#[derive(Clone)]
pub struct BridgeTerminal {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<&'a str>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    login: i64,
    password: &'a str,
    server: &'a str,
}

#[derive(Serialize)]
struct HistoryBody {
    from: i64,
    to: i64,
}

#[derive(Deserialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Deserialize)]
struct DealsResponse {
    deals: Option<Vec<RawDeal>>,
}

/// Deal record as the terminal reports it
#[derive(Debug, Deserialize)]
pub(crate) struct RawDeal {
    ticket: u64,
    position_id: u64,
    /// Unix seconds
    time: i64,
    #[serde(rename = "type")]
    deal_type: u32,
    entry: u32,
    symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    volume: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    swap: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    commission: Decimal,
}

impl RawDeal {
    pub(crate) fn into_deal(self) -> Result<Deal> {
        let time = DateTime::<Utc>::from_timestamp(self.time, 0).ok_or_else(|| {
            SyncError::MalformedDeal {
                ticket: self.ticket,
                reason: format!("timestamp out of range: {}", self.time),
            }
        })?;
        let entry = DealEntry::from_code(self.entry).ok_or_else(|| SyncError::MalformedDeal {
            ticket: self.ticket,
            reason: format!("unknown entry code {}", self.entry),
        })?;

        Ok(Deal {
            ticket: self.ticket,
            position_id: self.position_id,
            time,
            symbol: self.symbol,
            deal_type: DealType::from_code(self.deal_type),
            entry,
            price: self.price,
            volume: self.volume,
            profit: self.profit,
            swap: self.swap,
            commission: self.commission,
        })
    }
}

impl BridgeTerminal {
    /// Create a client for the bridge listening at `bridge_url`
    pub fn new(bridge_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(bridge_url)
            .map_err(|e| SyncError::Validation(format!("invalid bridge url {bridge_url}: {e}")))?;
        // Endpoints are joined relative to the base, which must end in '/'
        // or its last path segment is replaced
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // No request timeout; terminal logins can block for a long time
        let client = Client::builder().build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::Validation(format!("invalid bridge path {path}: {e}")))
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = self.endpoint(path)?;
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::TerminalUnreachable(e.to_string()))?;

        Ok(resp.error_for_status()?.json().await?)
    }
}

#[async_trait]
impl TradingTerminal for BridgeTerminal {
    async fn initialize(&self, install_path: Option<String>) -> Result<bool> {
        let body = InitializeBody {
            path: install_path.as_deref(),
            login: None,
            password: None,
            server: None,
        };
        let resp: OkResponse = self.post("initialize", &body).await?;
        Ok(resp.ok)
    }

    async fn initialize_with_login(
        &self,
        request: &LoginRequest,
        install_path: Option<String>,
    ) -> Result<bool> {
        let body = InitializeBody {
            path: install_path.as_deref(),
            login: Some(request.login),
            password: Some(request.secret.as_str()),
            server: Some(&request.server),
        };
        let resp: OkResponse = self.post("initialize", &body).await?;
        Ok(resp.ok)
    }

    #[instrument(skip(self))]
    async fn login(&self, request: &LoginRequest) -> Result<bool> {
        let body = LoginBody {
            login: request.login,
            password: request.secret.as_str(),
            server: &request.server,
        };
        let resp: OkResponse = self.post("login", &body).await?;
        Ok(resp.ok)
    }

    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<Deal>>> {
        let body = HistoryBody {
            from: from.timestamp(),
            to: to.timestamp(),
        };
        let resp: DealsResponse = self.post("history_deals", &body).await?;

        let Some(raw) = resp.deals else {
            return Ok(None);
        };
        debug!("Bridge returned {} deals", raw.len());

        raw.into_iter()
            .map(RawDeal::into_deal)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    async fn shutdown(&self) -> Result<()> {
        let _: OkResponse = self.post("shutdown", &serde_json::json!({})).await?;
        Ok(())
    }

    async fn last_error(&self) -> Result<TerminalError> {
        let url = self.endpoint("last_error")?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::TerminalUnreachable(e.to_string()))?;

        Ok(resp.error_for_status()?.json().await?)
    }
}
