//! Context provided to enforcement checks.

use chrono::{DateTime, Utc};

/// What a policy check can see about a pending push.
#[derive(Clone, Debug, PartialEq)]
pub struct PushContext {
    /// Name of the template being pushed
    pub template: String,
    /// Stack depth before the push
    pub depth: usize,
    /// Names of the states on the stack, root first
    pub stack: Vec<String>,
    pub requested_at: DateTime<Utc>,
}

impl PushContext {
    /// Name of the current top state (pure)
    pub fn top(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    /// Whether a state with the template's name is already on the stack (pure)
    pub fn template_on_stack(&self) -> bool {
        self.stack.iter().any(|name| *name == self.template)
    }
}
