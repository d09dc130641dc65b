//! Builder API for creating push policies.

use crate::enforcement::context::PushContext;
use crate::enforcement::rules::{TransitionPolicy, ValidationCheck};
use crate::enforcement::violations::{ViolationError, ViolationStrategy};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for creating push policies
pub struct PolicyBuilder {
    max_depth: Option<usize>,
    unique_templates: bool,
    required_checks: Vec<ValidationCheck>,
    on_violation: ViolationStrategy,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: None,
            unique_templates: false,
            required_checks: Vec::new(),
            on_violation: ViolationStrategy::Reject,
        }
    }

    /// Refuse pushes once the stack holds `n` states
    pub fn max_depth(mut self, n: usize) -> Self {
        self.max_depth = Some(n);
        self
    }

    /// Refuse pushing a state that is already somewhere on the stack
    pub fn unique_templates(mut self) -> Self {
        self.unique_templates = true;
        self
    }

    /// Add a custom validation check
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&PushContext) -> Validation<(), NonEmptyVec<ViolationError>> + Send + Sync + 'static,
    {
        self.required_checks.push(Box::new(check));
        self
    }

    /// Add a simple predicate check with error message
    pub fn require_pred<F>(mut self, predicate: F, error_msg: String) -> Self
    where
        F: Fn(&PushContext) -> bool + Send + Sync + 'static,
    {
        let check = move |ctx: &PushContext| {
            if predicate(ctx) {
                Validation::success(())
            } else {
                Validation::fail(ViolationError::CustomCheckFailed {
                    message: error_msg.clone(),
                })
            }
        };
        self.required_checks.push(Box::new(check));
        self
    }

    /// Set violation handling strategy
    pub fn on_violation(mut self, strategy: ViolationStrategy) -> Self {
        self.on_violation = strategy;
        self
    }

    pub fn build(self) -> TransitionPolicy {
        TransitionPolicy {
            max_depth: self.max_depth,
            unique_templates: self.unique_templates,
            required_checks: self.required_checks,
            on_violation: self.on_violation,
        }
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
