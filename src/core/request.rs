//! Transition requests and the templates pushed states are built from.

use super::error::StateError;
use super::scope::{Bindings, Scope};
use super::state::{State, StateId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for state factory functions.
pub type StateFactory =
    Arc<dyn Fn(&Scope) -> Result<Box<dyn State>, StateError> + Send + Sync>;

/// Recipe for constructing a state: a name, the bindings every instance gets,
/// and a factory that resolves the state's dependencies from its scope.
///
/// Templates are cheap to clone, so parents usually keep the templates of
/// the children they may push.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use navstack::core::{Scope, State, StateTemplate};
///
/// struct Popup {
///     launch: String,
/// }
///
/// #[async_trait]
/// impl State for Popup {
///     fn name(&self) -> &str {
///         "PayloadPopup"
///     }
/// }
///
/// let template = StateTemplate::new("PayloadPopup", |scope: &Scope| {
///     Ok(Popup {
///         launch: scope.resolve::<String>()?,
///     })
/// });
/// assert_eq!(template.name(), "PayloadPopup");
/// ```
#[derive(Clone)]
pub struct StateTemplate {
    name: Arc<str>,
    bindings: Bindings,
    factory: StateFactory,
}

impl StateTemplate {
    pub fn new<S, F>(name: impl Into<String>, factory: F) -> Self
    where
        S: State + 'static,
        F: Fn(&Scope) -> Result<S, StateError> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            bindings: Bindings::new(),
            factory: Arc::new(move |scope: &Scope| {
                factory(scope).map(|state| Box::new(state) as Box<dyn State>)
            }),
        }
    }

    /// Bind a value into every scope created from this template.
    pub fn with_binding<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.bindings.bind(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Run the factory against a fully prepared scope.
    pub fn instantiate(&self, scope: &Scope) -> Result<Box<dyn State>, StateError> {
        (self.factory)(scope)
    }
}

impl fmt::Debug for StateTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTemplate")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Discriminant of a [`TransitionRequest`], used in history records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    Push,
    Pop,
}

/// A desired stack mutation, consumed exactly once by the machine.
#[derive(Clone, Debug)]
pub enum TransitionRequest {
    /// Push a state built from `template`, adding `bindings` to its scope.
    Push {
        template: StateTemplate,
        bindings: Bindings,
    },

    /// Pop the current top state.
    Pop,
}

impl TransitionRequest {
    pub fn push(template: StateTemplate) -> Self {
        Self::Push {
            template,
            bindings: Bindings::new(),
        }
    }

    pub fn push_with(template: StateTemplate, bindings: Bindings) -> Self {
        Self::Push { template, bindings }
    }

    pub fn pop() -> Self {
        Self::Pop
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::Push { .. } => TransitionKind::Push,
            Self::Pop => TransitionKind::Pop,
        }
    }
}

/// Where a state stands in its teardown, shared with its requesters.
///
/// `popped` is set when the state leaves the stack through a pop, before its
/// `exit` runs. `disposed` is set at the start of disposal.
#[derive(Debug, Default)]
pub(crate) struct Liveness {
    popped: AtomicBool,
    disposed: AtomicBool,
}

impl Liveness {
    pub(crate) fn mark_popped(&self) {
        self.popped.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_disposed(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_popped(&self) -> bool {
        self.popped.load(Ordering::SeqCst)
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// A request together with the state that raised it.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) origin: StateId,
    pub(crate) request: TransitionRequest,
    /// False if the origin was already disposed when the request was raised
    pub(crate) raised_live: bool,
    pub(crate) liveness: Arc<Liveness>,
}

impl Envelope {
    /// Whether the origin left the stack through a pop.
    pub(crate) fn origin_popped(&self) -> bool {
        self.liveness.is_popped()
    }
}

/// Cloneable handle for raising transition requests on behalf of a state.
///
/// Hand it to presenters or callbacks that react to user input. Requests are
/// only queued here; the machine handles them on its next drain. Requests
/// raised after the state was disposed are discarded, as are requests from a
/// state whose push failed.
#[derive(Clone, Debug)]
pub struct Requester {
    origin: StateId,
    tx: UnboundedSender<Envelope>,
    liveness: Arc<Liveness>,
}

impl Requester {
    pub(crate) fn new(origin: StateId, tx: UnboundedSender<Envelope>) -> Self {
        Self {
            origin,
            tx,
            liveness: Arc::default(),
        }
    }

    /// The state on whose behalf requests are raised.
    pub fn origin(&self) -> StateId {
        self.origin
    }

    pub(crate) fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    pub fn request(&self, request: TransitionRequest) {
        let kind = request.kind();
        let envelope = Envelope {
            origin: self.origin,
            request,
            raised_live: !self.liveness.is_disposed(),
            liveness: Arc::clone(&self.liveness),
        };
        if self.tx.send(envelope).is_err() {
            tracing::debug!(
                origin = %self.origin,
                kind = ?kind,
                "Transition request dropped, machine is gone"
            );
        }
    }

    pub fn push(&self, template: StateTemplate) {
        self.request(TransitionRequest::push(template));
    }

    pub fn push_with(&self, template: StateTemplate, bindings: Bindings) {
        self.request(TransitionRequest::push_with(template, bindings));
    }

    pub fn pop(&self) {
        self.request(TransitionRequest::pop());
    }
}
