//! Builder API and configuration for state machines.
//!
//! [`StateMachineBuilder`] assembles a [`StateMachine`](crate::machine::StateMachine)
//! from a [`MachineConfig`], an optional scope provider, an optional push
//! policy and any number of event listeners.

pub mod config;
pub mod error;
pub mod machine;

pub use config::{MachineConfig, DEFAULT_HISTORY_LIMIT};
pub use error::BuildError;
pub use machine::StateMachineBuilder;
