//! Scheduler
//!
//! Runs one cycle, waits the configured interval, repeats until shutdown.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::orchestrator::SyncOrchestrator;
use super::traits::{AccountCatalog, PositionStore};
use crate::config::SyncConfig;
use crate::coordination::GracefulShutdown;
use crate::terminal::TradingTerminal;

pub struct Scheduler {
    interval: Duration,
    poll: Duration,
    shutdown: Arc<GracefulShutdown>,
}

impl Scheduler {
    pub fn new(interval: Duration, poll: Duration, shutdown: Arc<GracefulShutdown>) -> Self {
        Self {
            interval,
            poll,
            shutdown,
        }
    }

    pub fn from_config(config: &SyncConfig, shutdown: Arc<GracefulShutdown>) -> Self {
        Self::new(config.interval(), config.cancel_poll(), shutdown)
    }

    /// Run cycles until shutdown is requested. Returns the number of cycles
    /// started.
    pub async fn run<C, S, T>(&self, orchestrator: &SyncOrchestrator<C, S, T>) -> u64
    where
        C: AccountCatalog,
        S: PositionStore,
        T: TradingTerminal,
    {
        info!(
            "Sync worker started (interval: {}s)",
            self.interval.as_secs()
        );

        let mut cycles = 0;
        while self.shutdown.is_running() {
            cycles += 1;
            if let Err(e) = orchestrator.run_cycle().await {
                error!("Cycle {} aborted, retrying next interval: {}", cycles, e);
            }

            if !self
                .shutdown
                .sleep_while_running(self.interval, self.poll)
                .await
            {
                break;
            }
        }

        info!("Sync worker stopped after {} cycles", cycles);
        cycles
    }
}
