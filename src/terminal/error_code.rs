//! Terminal result codes
//!
//! The login loop only needs to know whether a failure means "this server
//! name does not exist" (try the next variant) or anything else (stop).

/// Generic failure; returned when the server name is unknown
pub const E_FAIL: i32 = -1;
pub const E_INVALID_PARAMS: i32 = -2;
pub const E_INVALID_VERSION: i32 = -5;
pub const E_AUTH_FAILED: i32 = -6;
pub const E_AUTO_TRADING_DISABLED: i32 = -8;
pub const E_INTERNAL_FAIL: i32 = -10000;
pub const E_INTERNAL_FAIL_TIMEOUT: i32 = -10005;
/// Trade server side "no connection" / "server not found" answers
pub const E_SERVER_NO_CONNECTION: i32 = 10001;
pub const E_SERVER_NOT_FOUND: i32 = 10002;

const IPC_TIMEOUT_HINT: &str = "IPC timeout: make sure the terminal is open, \
     Algo Trading is enabled (Tools > Options > Expert Advisors), and set \
     terminal.install_path when several terminals are installed";

/// Closed classification of terminal result codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The server name did not resolve
    ServerNotFound,
    /// Wrong login or secret
    Authentication,
    AutoTradingDisabled,
    /// IPC between the bridge and the terminal process failed
    Transport,
    Other,
}

impl ErrorCategory {
    pub fn from_code(code: i32) -> Self {
        match code {
            E_FAIL | E_INVALID_PARAMS | E_INVALID_VERSION | E_SERVER_NO_CONNECTION
            | E_SERVER_NOT_FOUND => ErrorCategory::ServerNotFound,
            E_AUTH_FAILED => ErrorCategory::Authentication,
            E_AUTO_TRADING_DISABLED => ErrorCategory::AutoTradingDisabled,
            E_INTERNAL_FAIL_TIMEOUT..=E_INTERNAL_FAIL => ErrorCategory::Transport,
            _ => ErrorCategory::Other,
        }
    }

    /// Only an unresolved server name is worth retrying with another variant
    pub fn allows_next_candidate(&self) -> bool {
        matches!(self, ErrorCategory::ServerNotFound)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::ServerNotFound => write!(f, "server_not_found"),
            ErrorCategory::Authentication => write!(f, "authentication"),
            ErrorCategory::AutoTradingDisabled => write!(f, "auto_trading_disabled"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Other => write!(f, "other"),
        }
    }
}

/// Operator hint for codes that usually mean a local setup problem
pub fn hint_for(code: i32) -> Option<&'static str> {
    (code == E_INTERNAL_FAIL_TIMEOUT).then_some(IPC_TIMEOUT_HINT)
}
