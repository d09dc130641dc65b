//! Per-state handle passed to every lifecycle hook.

use super::error::StateError;
use super::request::{Liveness, Requester, StateTemplate, TransitionRequest};
use super::scope::{Bindings, Scope};
use super::state::StateId;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a state knows about itself while it is alive: its identity, its
/// cancellation token, its resource scope and a way to request navigation.
///
/// Pass [`StateContext::cancellation`] to any long-running work the state
/// starts. The token is cancelled when the state is popped or the
/// application shuts down, always before the scope is released.
#[derive(Debug)]
pub struct StateContext {
    id: StateId,
    name: String,
    depth: usize,
    token: CancellationToken,
    scope: Option<Arc<Scope>>,
    requester: Requester,
}

impl StateContext {
    pub(crate) fn new(
        id: StateId,
        name: String,
        depth: usize,
        token: CancellationToken,
        scope: Arc<Scope>,
        requester: Requester,
    ) -> Self {
        Self {
            id,
            name,
            depth,
            token,
            scope: Some(scope),
            requester,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position on the stack, the root being 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail with [`StateError::Cancelled`] if the token has fired.
    pub fn check_cancelled(&self) -> Result<(), StateError> {
        if self.token.is_cancelled() {
            Err(StateError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The state's scope. Borrowed only, so nothing outlives disposal.
    pub fn scope(&self) -> Result<&Scope, StateError> {
        self.shared_scope().map(|scope| &**scope)
    }

    /// Shared handle used by the machine to parent child scopes.
    pub(crate) fn shared_scope(&self) -> Result<&Arc<Scope>, StateError> {
        self.scope.as_ref().ok_or_else(|| StateError::ScopeReleased {
            state: self.name.clone(),
        })
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, StateError> {
        self.scope()?.get::<T>()
    }

    pub fn resolve<T: Any + Send + Sync + Clone>(&self) -> Result<T, StateError> {
        self.scope()?.resolve::<T>()
    }

    /// A cloneable request handle for presenters and callbacks.
    pub fn requester(&self) -> Requester {
        self.requester.clone()
    }

    pub fn request(&self, request: TransitionRequest) {
        self.requester.request(request);
    }

    pub fn request_push(&self, template: StateTemplate) {
        self.requester.push(template);
    }

    /// Push `template`, passing domain data to the child through `bindings`.
    pub fn request_push_with(&self, template: StateTemplate, bindings: Bindings) {
        self.requester.push_with(template, bindings);
    }

    pub fn request_pop(&self) {
        self.requester.pop();
    }

    pub(crate) fn liveness(&self) -> &Liveness {
        self.requester.liveness()
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn release_scope(&mut self) -> Option<Arc<Scope>> {
        self.scope.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn context(token: CancellationToken) -> StateContext {
        let (tx, _rx) = unbounded_channel();
        let id = StateId::new();
        let scope = Scope::root("Boot").with_bindings(Bindings::new().with(20u8));
        StateContext::new(
            id,
            "Boot".to_string(),
            1,
            token,
            Arc::new(scope),
            Requester::new(id, tx),
        )
    }

    #[test]
    fn resolves_from_scope() {
        let ctx = context(CancellationToken::new());

        assert_eq!(ctx.resolve::<u8>().unwrap(), 20);
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.requester().origin(), ctx.id());
    }

    #[test]
    fn released_scope_is_reported() {
        let mut ctx = context(CancellationToken::new());
        assert!(ctx.release_scope().is_some());

        assert!(matches!(
            ctx.resolve::<u8>(),
            Err(StateError::ScopeReleased { .. })
        ));
        assert!(ctx.release_scope().is_none());
    }

    #[test]
    fn releasing_scope_drops_last_reference() {
        let mut ctx = context(CancellationToken::new());
        let weak = Arc::downgrade(ctx.shared_scope().unwrap());
        assert_eq!(ctx.scope().unwrap().name(), "Boot");

        drop(ctx.release_scope());

        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn observes_parent_cancellation() {
        let app = CancellationToken::new();
        let ctx = context(app.child_token());

        assert!(ctx.check_cancelled().is_ok());
        app.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check_cancelled(), Err(StateError::Cancelled)));
    }
}
