//! Errors raised by states, scopes and state factories.

use thiserror::Error;

/// Errors that can occur inside a state's lifecycle or while building it.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("No binding of type '{type_name}' in scope '{scope}'")]
    MissingBinding {
        type_name: &'static str,
        scope: String,
    },

    #[error("Scope of state '{state}' has already been released")]
    ScopeReleased { state: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("State machine has not been started. Call push_first() first")]
    NotStarted,

    #[error("State '{state}' failed: {message}")]
    Failed { state: String, message: String },
}

impl StateError {
    /// Shorthand for a [`StateError::Failed`] raised by a named state.
    pub fn failed(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            state: state.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_formats_state_and_message() {
        let err = StateError::failed("Boot", "orbital data missing");
        assert_eq!(err.to_string(), "State 'Boot' failed: orbital data missing");
    }

    #[test]
    fn missing_binding_names_type_and_scope() {
        let err = StateError::MissingBinding {
            type_name: "u32",
            scope: "Launches".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No binding of type 'u32' in scope 'Launches'"
        );
    }
}
