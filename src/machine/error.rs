//! Errors surfaced by the state machine to its caller.

use crate::core::StateError;
use thiserror::Error;

/// Errors that can occur while driving the navigation stack.
///
/// Failed pushes never show up here: they are logged, reported through
/// [`MachineEvent::PushFailed`](super::MachineEvent::PushFailed) and
/// abandoned. Pops and the root's entry propagate.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Root state already installed. push_first() may only be called once")]
    AlreadyStarted,

    #[error("Root state '{state}' failed to enter: {source}")]
    RootEnterFailed {
        state: String,
        #[source]
        source: StateError,
    },

    #[error("State '{state}' failed to exit: {source}")]
    ExitFailed {
        state: String,
        #[source]
        source: StateError,
    },

    #[error("State '{state}' failed to resume: {source}")]
    ResumeFailed {
        state: String,
        #[source]
        source: StateError,
    },
}

impl TransitionError {
    /// Name of the state whose hook failed, if any.
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::AlreadyStarted => None,
            Self::RootEnterFailed { state, .. }
            | Self::ExitFailed { state, .. }
            | Self::ResumeFailed { state, .. } => Some(state),
        }
    }
}
