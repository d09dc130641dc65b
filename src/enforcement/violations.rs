//! Violation errors and handling strategies.

use thiserror::Error;

/// Errors that can occur when enforcing push policies
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViolationError {
    #[error("Maximum stack depth ({max}) reached (current: {depth})")]
    MaxDepthExceeded { max: usize, depth: usize },

    #[error("State '{template}' is already on the stack")]
    AlreadyOnStack { template: String },

    #[error("Custom check failed: {message}")]
    CustomCheckFailed { message: String },
}

/// Strategy for handling policy violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationStrategy {
    /// Abandon the push
    Reject,

    /// Proceed with the push but log a warning
    IgnoreAndLog,
}
