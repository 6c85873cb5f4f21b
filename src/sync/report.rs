use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Why an account was not synced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Login, secret or server name missing
    MissingCredentials,
    ConnectFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCredentials => write!(f, "missing terminal credentials"),
            SkipReason::ConnectFailed(reason) => write!(f, "connection failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    Synced { positions: usize, server: String },
    Skipped(SkipReason),
    /// Connected, but history, aggregation or the write failed. Counts as
    /// zero positions synced.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AccountReport {
    pub account_id: Uuid,
    pub name: String,
    pub outcome: AccountOutcome,
}

/// Result of one sync cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub accounts: Vec<AccountReport>,
    /// Shutdown was requested before every account was visited
    pub interrupted: bool,
}

impl CycleReport {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            accounts: Vec::new(),
            interrupted: false,
        }
    }

    /// Accounts that got past the connect step
    pub fn processed(&self) -> usize {
        self.accounts
            .iter()
            .filter(|a| !matches!(a.outcome, AccountOutcome::Skipped(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.accounts
            .iter()
            .filter(|a| matches!(a.outcome, AccountOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.accounts
            .iter()
            .filter(|a| matches!(a.outcome, AccountOutcome::Failed(_)))
            .count()
    }

    pub fn positions_written(&self) -> usize {
        self.accounts
            .iter()
            .map(|a| match a.outcome {
                AccountOutcome::Synced { positions, .. } => positions,
                _ => 0,
            })
            .sum()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
