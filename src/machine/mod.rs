//! The navigation stack and its transition engine.
//!
//! This module is the imperative shell around the core types: it owns the
//! stack, runs lifecycle hooks, links cancellation tokens and releases
//! scopes.
//!
//! # Guarantees
//!
//! - The root state is never popped
//! - A parent's `on_suspend` completes before its child's `enter` begins
//! - A popped state's `exit` completes before it is disposed, and disposal
//!   completes before the new top's `on_resume`
//! - Disposal cancels a state's token before releasing its scope
//! - Transitions never overlap; requests raised mid-transition are queued

mod engine;
mod error;
mod events;
mod slot;

pub use engine::StateMachine;
pub use error::TransitionError;
pub use events::{EventListener, MachineEvent};
