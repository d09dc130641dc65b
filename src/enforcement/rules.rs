//! Push policies enforced using Validation.

use crate::enforcement::context::PushContext;
use crate::enforcement::violations::{ViolationError, ViolationStrategy};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for validation check functions
pub type ValidationCheck =
    Box<dyn Fn(&PushContext) -> Validation<(), NonEmptyVec<ViolationError>> + Send + Sync>;

/// Rules a push must satisfy before the parent is suspended.
/// Uses Validation to accumulate ALL violations.
pub struct TransitionPolicy {
    pub(crate) max_depth: Option<usize>,
    pub(crate) unique_templates: bool,
    pub(crate) required_checks: Vec<ValidationCheck>,
    pub(crate) on_violation: ViolationStrategy,
}

impl TransitionPolicy {
    /// Enforce all rules, accumulating ALL violations.
    /// Returns Validation::Success(()) if all checks pass.
    /// Returns Validation::Failure with ALL violations if any fail.
    pub fn enforce(&self, context: &PushContext) -> Validation<(), NonEmptyVec<ViolationError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ViolationError>>> = Vec::new();

        if let Some(max) = self.max_depth {
            let check = if context.depth >= max {
                Validation::fail(ViolationError::MaxDepthExceeded {
                    max,
                    depth: context.depth,
                })
            } else {
                Validation::success(())
            };
            checks.push(check);
        }

        if self.unique_templates {
            let check = if context.template_on_stack() {
                Validation::fail(ViolationError::AlreadyOnStack {
                    template: context.template.clone(),
                })
            } else {
                Validation::success(())
            };
            checks.push(check);
        }

        for check_fn in &self.required_checks {
            checks.push(check_fn(context));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    pub fn violation_strategy(&self) -> ViolationStrategy {
        self.on_violation
    }
}

impl std::fmt::Debug for TransitionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionPolicy")
            .field("max_depth", &self.max_depth)
            .field("unique_templates", &self.unique_templates)
            .field("required_checks", &self.required_checks.len())
            .field("on_violation", &self.on_violation)
            .finish()
    }
}
