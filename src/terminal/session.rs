//! Session Connector
//!
//! Owns the terminal for the duration of one sync cycle. Logging into an
//! account replaces the previous identity; the terminal is shut down exactly
//! once, when the session is closed.
//!
//! Release is only guaranteed on the `close()` path. A session dropped
//! without it (e.g. its future cancelled mid-cycle) logs an error and leaves
//! the terminal attached.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::error_code::{hint_for, E_INVALID_PARAMS};
use super::{LoginRequest, TerminalError, TradingTerminal};
use crate::domain::{Credentials, Deal};
use crate::error::{ConnectError, Result, SyncError};

/// Server name variants to try, nominal name first, without duplicates.
pub fn server_candidates(nominal: &str) -> Vec<String> {
    let variations = [
        nominal.to_string(),
        format!("{nominal}-server"),
        format!("{nominal}-Server"),
        format!("{nominal}-Real"),
        format!("{nominal}-Demo"),
        nominal.replace(' ', ""),
    ];

    let mut candidates: Vec<String> = Vec::with_capacity(variations.len());
    for candidate in variations {
        if candidate.is_empty() || candidates.contains(&candidate) {
            continue;
        }
        candidates.push(candidate);
    }
    candidates
}

/// Exclusive use of the terminal for one cycle
pub struct TerminalSession<'a, T: TradingTerminal + ?Sized> {
    terminal: &'a T,
    install_path: Option<String>,
    active_login: Option<i64>,
    closed: bool,
}

impl<'a, T: TradingTerminal + ?Sized> TerminalSession<'a, T> {
    /// Attach to the terminal. A failed attach is only logged: every
    /// `connect` initializes again before logging in.
    pub async fn open(terminal: &'a T, install_path: Option<String>) -> Self {
        match terminal.initialize(install_path.clone()).await {
            Ok(true) => debug!("Terminal initialized"),
            Ok(false) => warn!("Terminal initialize() refused; retrying per account"),
            Err(e) => warn!("Terminal initialize() failed: {}", e),
        }

        Self {
            terminal,
            install_path,
            active_login: None,
            closed: false,
        }
    }

    /// Login currently authenticated on the terminal, if any
    pub fn active_login(&self) -> Option<i64> {
        self.active_login
    }

    /// Log into the account, trying server name variants when the nominal
    /// name does not resolve. Returns the server name that worked.
    pub async fn connect(
        &mut self,
        credentials: &Credentials,
    ) -> std::result::Result<String, ConnectError> {
        let login = credentials.login;
        // Any attempt below may switch the terminal to another identity
        self.active_login = None;

        let nominal = LoginRequest::new(credentials, &credentials.server);
        let combined = self
            .terminal
            .initialize_with_login(&nominal, self.install_path.clone())
            .await
            .map_err(ConnectError::unreachable)?;

        if !combined {
            // Keep the terminal attached for the accounts that follow
            let attached = self
                .terminal
                .initialize(self.install_path.clone())
                .await
                .map_err(ConnectError::unreachable)?;

            if !attached {
                let err = self
                    .terminal
                    .last_error()
                    .await
                    .map_err(ConnectError::unreachable)?;
                error!("initialize() failed for #{}: {}", login, err);
                return Err(ConnectError::Unreachable {
                    detail: err.to_string(),
                    hint: hint_for(err.code),
                });
            }
        }

        let candidates = server_candidates(&credentials.server);
        let mut tried = Vec::with_capacity(candidates.len());
        let mut last_error = None;

        for server in candidates {
            let request = LoginRequest::new(credentials, &server);
            let authorized = self
                .terminal
                .login(&request)
                .await
                .map_err(ConnectError::unreachable)?;
            tried.push(server.clone());

            if authorized {
                self.active_login = Some(login);
                if server != credentials.server {
                    info!("Connected to #{} (server auto-detected: {})", login, server);
                } else {
                    info!("Connected to #{}", login);
                }
                return Ok(server);
            }

            let err = self
                .terminal
                .last_error()
                .await
                .map_err(ConnectError::unreachable)?;
            let category = err.category();

            if !category.allows_next_candidate() {
                warn!(
                    "Login #{} on {} failed ({}): {}",
                    login, server, category, err
                );
                return Err(ConnectError::Rejected { server, error: err });
            }

            debug!("Server {} did not resolve for #{}: {}", server, login, err);
            last_error = Some(err);
        }

        let last = last_error
            .unwrap_or_else(|| TerminalError::new(E_INVALID_PARAMS, "empty server name"));
        warn!(
            "No server variant of {} resolved for #{}: {}",
            credentials.server, login, last
        );
        Err(ConnectError::Exhausted { tried, last })
    }

    /// Deal history of the logged-in account. A `None` answer from the
    /// terminal is treated as no deals.
    pub async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deal>> {
        if self.active_login.is_none() {
            return Err(SyncError::Validation(
                "history requested without an authenticated account".to_string(),
            ));
        }

        Ok(self.terminal.history_deals(from, to).await?.unwrap_or_default())
    }

    /// Detach from the terminal. Consumes the session so it happens once.
    pub async fn close(mut self) {
        self.closed = true;
        self.active_login = None;
        match self.terminal.shutdown().await {
            Ok(()) => debug!("Terminal shut down"),
            Err(e) => warn!("Terminal shutdown failed: {}", e),
        }
    }
}

impl<T: TradingTerminal + ?Sized> Drop for TerminalSession<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            error!("Terminal session dropped without close(); terminal left attached");
        }
    }
}
