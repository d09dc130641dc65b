//! Lifecycle notifications emitted by the machine.

use crate::core::StateId;
use serde::Serialize;
use std::sync::Arc;

/// Something that happened to a state on the stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MachineEvent {
    /// A state was placed on the stack and is about to enter.
    Entered {
        id: StateId,
        name: String,
        depth: usize,
    },

    /// The top state was suspended ahead of a push.
    Suspended {
        id: StateId,
        name: String,
        depth: usize,
    },

    /// A state became the top again after its child was popped.
    Resumed {
        id: StateId,
        name: String,
        depth: usize,
    },

    /// A popped state finished its exit hook.
    Exited {
        id: StateId,
        name: String,
        depth: usize,
    },

    /// A state's token was cancelled and its scope released.
    Disposed {
        id: StateId,
        name: String,
        depth: usize,
    },

    /// A push was abandoned after an error.
    PushFailed { template: String, reason: String },

    /// A push was refused by the transition policy.
    PushRejected {
        template: String,
        violations: Vec<String>,
    },
}

impl MachineEvent {
    /// Name of the state or template the event concerns.
    pub fn subject(&self) -> &str {
        match self {
            Self::Entered { name, .. }
            | Self::Suspended { name, .. }
            | Self::Resumed { name, .. }
            | Self::Exited { name, .. }
            | Self::Disposed { name, .. } => name,
            Self::PushFailed { template, .. } | Self::PushRejected { template, .. } => template,
        }
    }
}

/// Type alias for event listener functions.
pub type EventListener = Arc<dyn Fn(&MachineEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_covers_state_and_template_events() {
        let entered = MachineEvent::Entered {
            id: StateId::new(),
            name: "Launches".to_string(),
            depth: 3,
        };
        let rejected = MachineEvent::PushRejected {
            template: "PayloadPopup".to_string(),
            violations: vec!["already on stack".to_string()],
        };

        assert_eq!(entered.subject(), "Launches");
        assert_eq!(rejected.subject(), "PayloadPopup");
    }

    #[test]
    fn event_serializes_with_variant_tag() {
        let event = MachineEvent::PushFailed {
            template: "Boot".to_string(),
            reason: "network".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["PushFailed"]["template"], "Boot");
    }
}
