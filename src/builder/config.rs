//! Runtime configuration for a state machine.

use crate::builder::error::BuildError;
use serde::{Deserialize, Serialize};

/// Default number of navigation records kept in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Tunables for a [`StateMachine`](crate::machine::StateMachine).
///
/// Every field has a default, so partial JSON documents are accepted.
///
/// # Example
///
/// ```rust
/// use navstack::builder::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "label": "client", "history_limit": 16 }"#).unwrap();
/// assert_eq!(config.label, "client");
/// assert_eq!(config.history_limit, 16);
/// assert!(config.resume_parent_on_failed_push);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Attached to every log event the machine emits
    pub label: String,

    /// Resume the parent when a push fails after the parent was suspended
    pub resume_parent_on_failed_push: bool,

    /// Maximum number of navigation records kept
    pub history_limit: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            label: "navstack".to_string(),
            resume_parent_on_failed_push: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BuildError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.history_limit == 0 {
            return Err(BuildError::InvalidHistoryLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resume_parent() {
        let config = MachineConfig::default();
        assert!(config.resume_parent_on_failed_push);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let result = MachineConfig::from_json(r#"{ "history_limit": 0 }"#);
        assert!(matches!(result, Err(BuildError::InvalidHistoryLimit)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let result = MachineConfig::from_json(r#"{ "label": 7 }"#);
        assert!(matches!(result, Err(BuildError::InvalidConfig(_))));
    }
}
