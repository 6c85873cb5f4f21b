//! Trading terminal access
//!
//! The terminal is a single stateful process that holds at most one
//! authenticated account at a time:
//! - [`TradingTerminal`] is the raw session API
//! - [`error_code`] maps raw result codes onto a closed set of categories
//! - [`BridgeTerminal`] talks to the terminal through its local HTTP bridge
//! - [`TerminalSession`] owns the terminal for one sync cycle and resolves
//!   server names when logging in

pub mod bridge;
pub mod error_code;
pub mod session;

pub use bridge::BridgeTerminal;
pub use error_code::ErrorCategory;
pub use session::{server_candidates, TerminalSession};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{Credentials, Deal};
use crate::error::Result;

/// Last error reported by the terminal
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct TerminalError {
    pub code: i32,
    pub message: String,
}

impl TerminalError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code)
    }
}

/// Login attempt against one concrete server name
#[derive(Clone, PartialEq)]
pub struct LoginRequest {
    pub login: i64,
    pub secret: Zeroizing<String>,
    pub server: String,
}

impl LoginRequest {
    pub fn new(credentials: &Credentials, server: &str) -> Self {
        Self {
            login: credentials.login,
            secret: credentials.secret.clone(),
            server: server.to_string(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Session API of the trading terminal.
///
/// `Ok(false)` means the terminal answered and refused; details are then
/// available from [`TradingTerminal::last_error`]. `Err` means the terminal
/// could not be reached at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradingTerminal: Send + Sync {
    /// Attach to the terminal process without credentials
    async fn initialize(&self, install_path: Option<String>) -> Result<bool>;

    /// Attach to the terminal process and authenticate in one call
    async fn initialize_with_login(
        &self,
        request: &LoginRequest,
        install_path: Option<String>,
    ) -> Result<bool>;

    /// Authenticate, replacing whatever account was logged in before
    async fn login(&self, request: &LoginRequest) -> Result<bool>;

    /// Deals of the logged-in account; `None` when the terminal has no answer
    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<Deal>>>;

    /// Detach from the terminal process
    async fn shutdown(&self) -> Result<()>;

    async fn last_error(&self) -> Result<TerminalError>;
}

#[async_trait]
impl<T: TradingTerminal + ?Sized> TradingTerminal for std::sync::Arc<T> {
    async fn initialize(&self, install_path: Option<String>) -> Result<bool> {
        (**self).initialize(install_path).await
    }

    async fn initialize_with_login(
        &self,
        request: &LoginRequest,
        install_path: Option<String>,
    ) -> Result<bool> {
        (**self).initialize_with_login(request, install_path).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<bool> {
        (**self).login(request).await
    }

    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<Deal>>> {
        (**self).history_deals(from, to).await
    }

    async fn shutdown(&self) -> Result<()> {
        (**self).shutdown().await
    }

    async fn last_error(&self) -> Result<TerminalError> {
        (**self).last_error().await
    }
}
