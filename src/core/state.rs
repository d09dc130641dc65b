//! The lifecycle contract every navigable state implements.

use super::context::StateContext;
use super::error::StateError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one constructed state instance.
///
/// A new id is minted every time a template is instantiated, so pushing the
/// same template twice yields two distinct ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(Uuid);

impl StateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A unit of navigable application flow.
///
/// The machine drives each state through
/// `enter → (tick* | on_suspend/on_resume)* → exit`, awaiting every async
/// hook to completion before starting the next one. Hooks never overlap,
/// neither within one state nor across states.
///
/// States ask for navigation through their [`StateContext`]; the request is
/// queued and handled once the hook that raised it (and any transition in
/// flight) has finished.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use navstack::core::{State, StateContext, StateError};
///
/// struct MainMenu {
///     visible: bool,
/// }
///
/// #[async_trait]
/// impl State for MainMenu {
///     fn name(&self) -> &str {
///         "MainMenu"
///     }
///
///     async fn enter(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
///         self.visible = true;
///         Ok(())
///     }
///
///     async fn on_suspend(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
///         self.visible = false;
///         Ok(())
///     }
///
///     async fn on_resume(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
///         self.visible = true;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait State: Send {
    /// Name used in logs, history and snapshots.
    fn name(&self) -> &str;

    /// Runs when the state becomes the active top of the stack.
    async fn enter(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        Ok(())
    }

    /// Runs immediately before a child is pushed on top of this state.
    async fn on_suspend(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        Ok(())
    }

    /// Runs immediately after this state's child has been popped.
    async fn on_resume(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        Ok(())
    }

    /// Runs when the state is popped, before teardown. Release any
    /// subscriptions installed in `enter` here.
    async fn exit(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        Ok(())
    }

    /// Per-frame hook, only called while this state is the top. Must not block.
    fn tick(&mut self, _ctx: &StateContext) {}

    /// State-specific teardown. Runs once, before the state's token is
    /// cancelled and its scope released.
    fn on_dispose(&mut self) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A state with no behaviour.
    pub(crate) struct Inert(pub &'static str);

    #[async_trait]
    impl State for Inert {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = StateId::new();
        let b = StateId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_display_is_compact_hex() {
        let id = StateId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 32);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn id_serializes_correctly() {
        let id = StateId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn inert_state_uses_default_tick() {
        let mut state = Inert("Idle");
        assert_eq!(state.name(), "Idle");
        state.on_dispose();
    }
}
