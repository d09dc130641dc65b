//! Stack-based state machine with scoped lifetimes and cooperative cancellation.

use crate::builder::MachineConfig;
use crate::core::{
    Bindings, ChildScopeProvider, Envelope, NavigationHistory, NavigationRecord, Requester, Scope,
    ScopeProvider, State, StateContext, StateError, StateId, StateTemplate, TransitionKind,
    TransitionRequest,
};
use crate::enforcement::{PushContext, TransitionPolicy, ViolationStrategy};
use crate::machine::error::TransitionError;
use crate::machine::events::{EventListener, MachineEvent};
use crate::machine::slot::StateSlot;
use crate::snapshot::{FrameSnapshot, StackSnapshot};
use chrono::Utc;
use std::sync::Arc;
use stillwater::validation::Validation;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Owns the navigation stack and serializes every push and pop.
///
/// The host calls [`push_first`](Self::push_first) once at startup, then
/// [`tick`](Self::tick) and [`run_pending`](Self::run_pending) every frame.
/// States raise requests through their [`StateContext`]; those are queued and
/// handled one at a time, in the order issued, by `run_pending`. A request
/// raised while a transition is in flight (for example from `enter`) waits
/// until that transition has completed.
///
/// Every non-root state gets a child of the application token, so cancelling
/// the application token reaches every live state while popping a state
/// cancels only that state's token.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use navstack::core::{Scope, State, StateContext, StateError, StateTemplate};
/// use navstack::machine::StateMachine;
/// use tokio_util::sync::CancellationToken;
///
/// struct Menu;
///
/// #[async_trait]
/// impl State for Menu {
///     fn name(&self) -> &str {
///         "Menu"
///     }
/// }
///
/// struct Root {
///     menu: StateTemplate,
/// }
///
/// #[async_trait]
/// impl State for Root {
///     fn name(&self) -> &str {
///         "Root"
///     }
///
///     async fn enter(&mut self, ctx: &StateContext) -> Result<(), StateError> {
///         ctx.request_push(self.menu.clone());
///         Ok(())
///     }
/// }
///
/// # tokio_test_block(async {
/// let menu = StateTemplate::new("Menu", |_scope: &Scope| Ok(Menu));
/// let mut machine = StateMachine::new();
/// machine
///     .push_first(Root { menu }, Scope::root("root"), CancellationToken::new())
///     .await
///     .unwrap();
///
/// assert_eq!(machine.state_names(), vec!["Root", "Menu"]);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct StateMachine {
    stack: Vec<StateSlot>,
    app_token: Option<CancellationToken>,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
    provider: Arc<dyn ScopeProvider>,
    policy: Option<TransitionPolicy>,
    config: MachineConfig,
    history: NavigationHistory,
    listeners: Vec<EventListener>,
}

impl StateMachine {
    /// Create a machine with the default configuration and scope provider.
    pub fn new() -> Self {
        Self::from_parts(
            MachineConfig::default(),
            Arc::new(ChildScopeProvider),
            None,
            Vec::new(),
        )
    }

    pub(crate) fn from_parts(
        config: MachineConfig,
        provider: Arc<dyn ScopeProvider>,
        policy: Option<TransitionPolicy>,
        listeners: Vec<EventListener>,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            stack: Vec::new(),
            app_token: None,
            tx,
            rx,
            provider,
            policy,
            history: NavigationHistory::limited(config.history_limit),
            config,
            listeners,
        }
    }

    /// Register a lifecycle event listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&MachineEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Install the root state and enter it.
    ///
    /// The root bypasses the request protocol, is never popped, and shares
    /// `app_token` rather than owning a child of it. Requests the root raises
    /// while entering are handled before this returns.
    pub async fn push_first<S: State + 'static>(
        &mut self,
        root: S,
        scope: Scope,
        app_token: CancellationToken,
    ) -> Result<(), TransitionError> {
        if self.app_token.is_some() {
            return Err(TransitionError::AlreadyStarted);
        }

        let id = StateId::new();
        let name = root.name().to_string();
        let ctx = StateContext::new(
            id,
            name.clone(),
            0,
            app_token.clone(),
            Arc::new(scope),
            Requester::new(id, self.tx.clone()),
        );
        self.app_token = Some(app_token);
        self.stack
            .push(StateSlot::new(Box::new(root), ctx, name.clone(), false));

        info!(machine = %self.config.label, state = %name, "Root state installed");
        self.emit(MachineEvent::Entered {
            id,
            name: name.clone(),
            depth: 0,
        });

        let entered = match self.stack.last_mut() {
            Some(root) => root.enter().await,
            None => Ok(()),
        };
        if let Err(source) = entered {
            error!(
                machine = %self.config.label,
                state = %name,
                error = %source,
                "Root state failed to enter"
            );
            return Err(TransitionError::RootEnterFailed {
                state: name,
                source,
            });
        }

        self.run_pending().await?;
        Ok(())
    }

    /// Per-frame hook. Ticks the top state only; never suspends.
    pub fn tick(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.tick();
        }
    }

    /// Handle every queued transition request, including requests raised
    /// while handling them, in the order they were issued.
    ///
    /// Requests from states that are no longer on the stack are dropped,
    /// except those a popped state raised before it was disposed (from its
    /// `exit`, for instance). Requests from a state whose push failed are
    /// always dropped.
    /// Failed pushes are logged and skipped. A failed pop stops the drain and
    /// is returned; requests still queued stay queued for the next call.
    ///
    /// Returns how many requests were handled.
    pub async fn run_pending(&mut self) -> Result<usize, TransitionError> {
        let mut handled = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            if !self.accepts(&envelope) {
                debug!(
                    machine = %self.config.label,
                    origin = %envelope.origin,
                    kind = ?envelope.request.kind(),
                    "Ignoring request from a state no longer on the stack"
                );
                continue;
            }

            handled += 1;
            match envelope.request {
                TransitionRequest::Push { template, bindings } => {
                    self.handle_push(template, bindings).await;
                }
                TransitionRequest::Pop => self.handle_pop().await?,
            }
        }
        Ok(handled)
    }

    /// Pop the top state on behalf of the host. Requests already queued are
    /// handled first, then the pop, then any requests the exit or resume
    /// raised. The pop itself is a no-op when only the root is left.
    pub async fn pop(&mut self) -> Result<(), TransitionError> {
        self.run_pending().await?;
        self.handle_pop().await?;
        self.run_pending().await?;
        Ok(())
    }

    /// Dispose every state top-down without running `exit`.
    ///
    /// Used at application teardown; also runs when the machine is dropped.
    pub fn shutdown(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        info!(
            machine = %self.config.label,
            depth = self.stack.len(),
            "Shutting down state machine"
        );
        while let Some(mut slot) = self.stack.pop() {
            self.dispose_slot(&mut slot);
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_started(&self) -> bool {
        self.app_token.is_some()
    }

    pub fn top_name(&self) -> Option<&str> {
        self.stack.last().map(StateSlot::name)
    }

    /// Names of the states on the stack, root first.
    pub fn state_names(&self) -> Vec<&str> {
        self.stack.iter().map(StateSlot::name).collect()
    }

    /// Context of the active state, if any.
    pub fn top_context(&self) -> Option<&StateContext> {
        self.stack.last().map(StateSlot::context)
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Capture the current stack for diagnostics.
    pub fn snapshot(&self) -> StackSnapshot {
        let top = self.stack.len().checked_sub(1);
        let frames = self
            .stack
            .iter()
            .enumerate()
            .map(|(index, slot)| FrameSnapshot {
                id: slot.id(),
                name: slot.name().to_string(),
                depth: slot.depth(),
                active: Some(index) == top,
                cancelled: slot.context().is_cancelled(),
            })
            .collect();
        StackSnapshot::new(self.config.label.clone(), frames, self.history.clone())
    }

    fn is_alive(&self, id: StateId) -> bool {
        self.stack.iter().any(|slot| slot.id() == id)
    }

    /// A request is handled if it was raised before its origin was disposed
    /// and the origin is either on the stack or left it through a pop.
    fn accepts(&self, envelope: &Envelope) -> bool {
        envelope.raised_live && (envelope.origin_popped() || self.is_alive(envelope.origin))
    }

    fn emit(&self, event: MachineEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    fn dispose_slot(&self, slot: &mut StateSlot) {
        if slot.dispose() {
            self.emit(MachineEvent::Disposed {
                id: slot.id(),
                name: slot.name().to_string(),
                depth: slot.depth(),
            });
        }
    }

    /// Consult the policy. Returns false if the push must be abandoned.
    fn admit(&self, template: &StateTemplate) -> bool {
        let Some(policy) = &self.policy else {
            return true;
        };

        let context = PushContext {
            template: template.name().to_string(),
            depth: self.stack.len(),
            stack: self
                .stack
                .iter()
                .map(|slot| slot.template().to_string())
                .collect(),
            requested_at: Utc::now(),
        };

        match policy.enforce(&context) {
            Validation::Success(_) => true,
            Validation::Failure(errors) => {
                let violations: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                match policy.violation_strategy() {
                    ViolationStrategy::Reject => {
                        warn!(
                            machine = %self.config.label,
                            template = %template.name(),
                            violations = ?violations,
                            "Push rejected by policy"
                        );
                        self.emit(MachineEvent::PushRejected {
                            template: template.name().to_string(),
                            violations,
                        });
                        false
                    }
                    ViolationStrategy::IgnoreAndLog => {
                        warn!(
                            machine = %self.config.label,
                            template = %template.name(),
                            violations = ?violations,
                            "Push violates policy, proceeding"
                        );
                        true
                    }
                }
            }
        }
    }

    async fn handle_push(&mut self, template: StateTemplate, bindings: Bindings) {
        if !self.admit(&template) {
            return;
        }

        let from = self.top_name().map(str::to_string);
        debug!(
            machine = %self.config.label,
            template = %template.name(),
            depth = self.stack.len(),
            "Push started"
        );

        let mut parent_suspended = false;
        match self
            .try_push(&template, bindings, &mut parent_suspended)
            .await
        {
            Ok(()) => {
                self.history = self.history.record(NavigationRecord {
                    kind: TransitionKind::Push,
                    from,
                    to: self.top_name().map(str::to_string),
                    depth: self.stack.len(),
                    timestamp: Utc::now(),
                });
                debug!(
                    machine = %self.config.label,
                    template = %template.name(),
                    depth = self.stack.len(),
                    "Push completed"
                );
            }
            Err(source) => {
                error!(
                    machine = %self.config.label,
                    template = %template.name(),
                    error = %source,
                    "Push failed"
                );
                self.emit(MachineEvent::PushFailed {
                    template: template.name().to_string(),
                    reason: source.to_string(),
                });
                if parent_suspended && self.config.resume_parent_on_failed_push {
                    self.resume_after_failed_push().await;
                }
            }
        }
    }

    /// Suspend the parent, build the child and enter it. On error the stack
    /// is back to its pre-push contents; `parent_suspended` tells the caller
    /// whether the parent's `on_suspend` completed.
    async fn try_push(
        &mut self,
        template: &StateTemplate,
        bindings: Bindings,
        parent_suspended: &mut bool,
    ) -> Result<(), StateError> {
        let app_token = self.app_token.clone().ok_or(StateError::NotStarted)?;
        let parent = self.stack.last_mut().ok_or(StateError::NotStarted)?;

        parent.suspend().await?;
        *parent_suspended = true;
        let suspended = MachineEvent::Suspended {
            id: parent.id(),
            name: parent.name().to_string(),
            depth: parent.depth(),
        };
        let parent_scope = Arc::clone(parent.context().shared_scope()?);
        self.emit(suspended);

        let token = app_token.child_token();
        let mut scoped = Bindings::new().with(token.clone());
        scoped.extend(bindings);

        let scope = match self.provider.create_scope(&parent_scope, template, scoped) {
            Ok(scope) => scope,
            Err(e) => {
                token.cancel();
                return Err(e);
            }
        };
        let state = match template.instantiate(&scope) {
            Ok(state) => state,
            Err(e) => {
                token.cancel();
                drop(scope);
                return Err(e);
            }
        };

        let id = StateId::new();
        let depth = self.stack.len();
        let name = state.name().to_string();
        let ctx = StateContext::new(
            id,
            name.clone(),
            depth,
            token,
            Arc::new(scope),
            Requester::new(id, self.tx.clone()),
        );
        self.stack.push(StateSlot::new(
            state,
            ctx,
            template.name().to_string(),
            true,
        ));
        self.emit(MachineEvent::Entered { id, name, depth });

        let entered = match self.stack.last_mut() {
            Some(child) => child.enter().await,
            None => Ok(()),
        };
        if let Err(source) = entered {
            if let Some(mut child) = self.stack.pop() {
                self.dispose_slot(&mut child);
            }
            return Err(source);
        }
        Ok(())
    }

    async fn resume_after_failed_push(&mut self) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        let resumed = parent.resume().await;
        let (id, name, depth) = (parent.id(), parent.name().to_string(), parent.depth());

        match resumed {
            Ok(()) => self.emit(MachineEvent::Resumed { id, name, depth }),
            Err(source) => error!(
                machine = %self.config.label,
                state = %name,
                error = %source,
                "Parent failed to resume after abandoned push"
            ),
        }
    }

    async fn handle_pop(&mut self) -> Result<(), TransitionError> {
        if self.stack.len() <= 1 {
            debug!(
                machine = %self.config.label,
                "Pop ignored, the root state is never popped"
            );
            return Ok(());
        }
        let Some(mut popped) = self.stack.pop() else {
            return Ok(());
        };

        popped.context().liveness().mark_popped();
        let name = popped.name().to_string();
        debug!(
            machine = %self.config.label,
            state = %name,
            depth = popped.depth(),
            "Pop started"
        );

        let exited = popped.exit().await;
        if exited.is_ok() {
            self.emit(MachineEvent::Exited {
                id: popped.id(),
                name: name.clone(),
                depth: popped.depth(),
            });
        }
        self.dispose_slot(&mut popped);
        drop(popped);

        if let Err(source) = exited {
            error!(
                machine = %self.config.label,
                state = %name,
                error = %source,
                "Pop failed"
            );
            return Err(TransitionError::ExitFailed {
                state: name,
                source,
            });
        }

        self.history = self.history.record(NavigationRecord {
            kind: TransitionKind::Pop,
            from: Some(name),
            to: self.top_name().map(str::to_string),
            depth: self.stack.len(),
            timestamp: Utc::now(),
        });

        if let Some(parent) = self.stack.last_mut() {
            let resumed = parent.resume().await;
            let (id, name, depth) = (parent.id(), parent.name().to_string(), parent.depth());
            match resumed {
                Ok(()) => self.emit(MachineEvent::Resumed { id, name, depth }),
                Err(source) => {
                    error!(
                        machine = %self.config.label,
                        state = %name,
                        error = %source,
                        "Pop failed, parent did not resume"
                    );
                    return Err(TransitionError::ResumeFailed {
                        state: name,
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StateMachine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
