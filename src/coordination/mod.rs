//! Coordination
//!
//! Process lifecycle for the sync worker: the keep-running flag and the OS
//! signal handlers that clear it.

pub mod shutdown;

pub use shutdown::{install_signal_handlers, GracefulShutdown, ShutdownSignal};
