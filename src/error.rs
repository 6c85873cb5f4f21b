use thiserror::Error;

use crate::terminal::TerminalError;

/// Main error type for the sync worker
#[derive(Error, Debug)]
pub enum SyncError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Terminal bridge errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Terminal unreachable: {0}")]
    TerminalUnreachable(String),

    // Data errors
    #[error("Malformed deal #{ticket}: {reason}")]
    MalformedDeal { ticket: u64, reason: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type alias for SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Why a terminal session could not be established for an account
#[derive(Error, Debug, Clone)]
pub enum ConnectError {
    #[error("terminal unreachable: {detail}")]
    Unreachable {
        detail: String,
        hint: Option<&'static str>,
    },

    #[error("server {server} rejected login: {error}")]
    Rejected { server: String, error: TerminalError },

    #[error("no server name variant resolved (tried {}): {last}", .tried.join(", "))]
    Exhausted {
        tried: Vec<String>,
        last: TerminalError,
    },
}

impl ConnectError {
    pub(crate) fn unreachable(err: SyncError) -> Self {
        ConnectError::Unreachable {
            detail: err.to_string(),
            hint: None,
        }
    }

    /// Operator guidance attached to the failure, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ConnectError::Unreachable { hint, .. } => *hint,
            _ => None,
        }
    }
}
