//! Builder for constructing state machines.

use crate::builder::config::MachineConfig;
use crate::builder::error::BuildError;
use crate::core::{ChildScopeProvider, ScopeProvider};
use crate::enforcement::TransitionPolicy;
use crate::machine::{EventListener, MachineEvent, StateMachine};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use navstack::builder::StateMachineBuilder;
/// use navstack::enforcement::PolicyBuilder;
///
/// let machine = StateMachineBuilder::new()
///     .label("space-client")
///     .history_limit(32)
///     .policy(PolicyBuilder::new().unique_templates().build())
///     .on_event(|event| println!("{event:?}"))
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.config().label, "space-client");
/// assert!(!machine.is_started());
/// ```
pub struct StateMachineBuilder {
    config: MachineConfig,
    provider: Option<Arc<dyn ScopeProvider>>,
    policy: Option<TransitionPolicy>,
    listeners: Vec<EventListener>,
}

impl StateMachineBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            provider: None,
            policy: None,
            listeners: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Whether a parent suspended for a push that then failed gets resumed.
    pub fn resume_parent_on_failed_push(mut self, resume: bool) -> Self {
        self.config.resume_parent_on_failed_push = resume;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Use a custom scope provider instead of [`ChildScopeProvider`].
    pub fn scope_provider<P: ScopeProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Check every push against `policy`.
    pub fn policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Register a lifecycle event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&MachineEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Build the state machine.
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        self.config.validate()?;

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(ChildScopeProvider));

        Ok(StateMachine::from_parts(
            self.config,
            provider,
            self.policy,
            self.listeners,
        ))
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
