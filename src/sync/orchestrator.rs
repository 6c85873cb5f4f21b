//! Sync Cycle Orchestrator
//!
//! One cycle: fetch the account catalog, then for each account connect,
//! aggregate its deal history and upsert the positions. Accounts are handled
//! strictly one after another because the terminal holds a single identity.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::aggregator::aggregate_deals;
use super::report::{AccountOutcome, AccountReport, CycleReport, SkipReason};
use super::traits::{AccountCatalog, PositionStore};
use crate::coordination::GracefulShutdown;
use crate::domain::Account;
use crate::error::Result;
use crate::terminal::{TerminalSession, TradingTerminal};

/// Per-cycle parameters
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Lower bound of the deal history window
    pub history_from: DateTime<Utc>,
    /// Terminal executable path forwarded on initialize
    pub install_path: Option<String>,
}

/// Drives sync cycles. Owns the terminal; nothing else talks to it.
pub struct SyncOrchestrator<C, S, T> {
    catalog: C,
    store: S,
    terminal: T,
    settings: SyncSettings,
    shutdown: Arc<GracefulShutdown>,
}

impl<C, S, T> SyncOrchestrator<C, S, T>
where
    C: AccountCatalog,
    S: PositionStore,
    T: TradingTerminal,
{
    pub fn new(
        catalog: C,
        store: S,
        terminal: T,
        settings: SyncSettings,
        shutdown: Arc<GracefulShutdown>,
    ) -> Self {
        Self {
            catalog,
            store,
            terminal,
            settings,
            shutdown,
        }
    }

    /// Run one full cycle.
    ///
    /// Only a failed catalog query is an error; every per-account failure is
    /// recorded in the report instead.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::start();
        info!("Starting sync cycle");

        let accounts = match self.catalog.fetch_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!("Account catalog query failed: {}", e);
                return Err(e);
            }
        };

        if accounts.is_empty() {
            info!("No accounts with terminal credentials configured");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        info!("Syncing {} accounts", accounts.len());

        let mut session =
            TerminalSession::open(&self.terminal, self.settings.install_path.clone()).await;
        self.sync_accounts(&mut session, &accounts, &mut report).await;
        session.close().await;

        report.finished_at = Utc::now();
        info!(
            "Cycle completed in {}ms: {} processed, {} skipped, {} failed, {} positions written{}",
            report.elapsed().num_milliseconds(),
            report.processed(),
            report.skipped(),
            report.failed(),
            report.positions_written(),
            if report.interrupted { " (interrupted)" } else { "" }
        );

        Ok(report)
    }

    // Infallible so the session is always closed by the caller
    async fn sync_accounts(
        &self,
        session: &mut TerminalSession<'_, T>,
        accounts: &[Account],
        report: &mut CycleReport,
    ) {
        for account in accounts {
            if self.shutdown.is_shutdown_requested() {
                warn!(
                    "Shutdown requested, skipping {} remaining accounts",
                    accounts.len() - report.accounts.len()
                );
                report.interrupted = true;
                break;
            }

            let outcome = self.sync_account(session, account).await;
            match &outcome {
                AccountOutcome::Synced { positions, .. } => {
                    info!("{}: synced {} positions", account.name, positions)
                }
                AccountOutcome::Skipped(SkipReason::MissingCredentials) => {
                    debug!("{}: skipped, {}", account.name, SkipReason::MissingCredentials)
                }
                AccountOutcome::Skipped(reason) => {
                    warn!("{}: skipped, {}", account.name, reason)
                }
                AccountOutcome::Failed(reason) => {
                    error!("{}: sync failed, 0 positions written: {}", account.name, reason)
                }
            }

            report.accounts.push(AccountReport {
                account_id: account.id,
                name: account.name.clone(),
                outcome,
            });
        }
    }

    #[instrument(skip_all, fields(account_id = %account.id))]
    async fn sync_account(
        &self,
        session: &mut TerminalSession<'_, T>,
        account: &Account,
    ) -> AccountOutcome {
        let Some(credentials) = account.credentials() else {
            return AccountOutcome::Skipped(SkipReason::MissingCredentials);
        };

        info!("Processing {} (#{})", account.name, credentials.login);

        let server = match session.connect(&credentials).await {
            Ok(server) => server,
            Err(e) => {
                if let Some(hint) = e.hint() {
                    warn!("{}", hint);
                }
                return AccountOutcome::Skipped(SkipReason::ConnectFailed(e.to_string()));
            }
        };

        match self.sync_positions(session, account).await {
            Ok(positions) => AccountOutcome::Synced { positions, server },
            Err(e) => AccountOutcome::Failed(e.to_string()),
        }
    }

    async fn sync_positions(
        &self,
        session: &TerminalSession<'_, T>,
        account: &Account,
    ) -> Result<usize> {
        let deals = session
            .history_deals(self.settings.history_from, Utc::now())
            .await?;
        debug!("Fetched {} deals", deals.len());

        let positions = aggregate_deals(deals, account.id, account.user_id)?;
        self.store.upsert_positions(&positions).await
    }
}
