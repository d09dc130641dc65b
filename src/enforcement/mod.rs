//! Validation-based push policies.
//!
//! A [`TransitionPolicy`] is consulted before every push, ahead of the
//! parent's `on_suspend`. Checks use Stillwater's `Validation` type so a
//! rejected push reports every rule it broke, not just the first.
//!
//! # Example
//!
//! ```rust
//! use navstack::enforcement::{PolicyBuilder, TransitionPolicy, ViolationStrategy};
//!
//! let policy: TransitionPolicy = PolicyBuilder::new()
//!     .max_depth(8)
//!     .unique_templates()
//!     .on_violation(ViolationStrategy::Reject)
//!     .build();
//! ```

pub mod builder;
pub mod context;
pub mod rules;
pub mod violations;

pub use builder::PolicyBuilder;
pub use context::PushContext;
pub use rules::TransitionPolicy;
pub use violations::{ViolationError, ViolationStrategy};
