//! Build errors for the state machine builder and its configuration.

use thiserror::Error;

/// Errors that can occur when configuring a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("History limit must be at least 1. Call .history_limit(n) with n > 0")]
    InvalidHistoryLimit,

    #[error("Invalid machine configuration: {0}")]
    InvalidConfig(String),
}
