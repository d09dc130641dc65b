//! Core state types.
//!
//! This module contains the building blocks the machine operates on:
//! - The `State` lifecycle trait and per-state `StateContext`
//! - Typed resource `Scope`s and the `ScopeProvider` seam
//! - `TransitionRequest`s and the `StateTemplate`s they push
//! - Immutable navigation history

mod context;
mod error;
mod history;
mod request;
mod scope;
pub(crate) mod state;

pub use context::StateContext;
pub use error::StateError;
pub use history::{NavigationHistory, NavigationRecord};
pub(crate) use request::Envelope;
pub use request::{Requester, StateFactory, StateTemplate, TransitionKind, TransitionRequest};
pub use scope::{Bindings, ChildScopeProvider, Scope, ScopeProvider};
pub use state::{State, StateId};
