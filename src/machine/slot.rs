//! A state on the stack together with the resources it owns.

use crate::core::{State, StateContext, StateError, StateId};

/// One stack entry: the state object, its context, and teardown bookkeeping.
pub(crate) struct StateSlot {
    state: Box<dyn State>,
    ctx: StateContext,
    template: String,
    owns_token: bool,
    suspended: bool,
    disposed: bool,
}

impl StateSlot {
    /// `owns_token` is false for the root, whose token is the application's.
    pub(crate) fn new(
        state: Box<dyn State>,
        ctx: StateContext,
        template: String,
        owns_token: bool,
    ) -> Self {
        Self {
            state,
            ctx,
            template,
            owns_token,
            suspended: false,
            disposed: false,
        }
    }

    pub(crate) fn id(&self) -> StateId {
        self.ctx.id()
    }

    pub(crate) fn name(&self) -> &str {
        self.ctx.name()
    }

    /// Name of the template the state was built from.
    pub(crate) fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn depth(&self) -> usize {
        self.ctx.depth()
    }

    pub(crate) fn context(&self) -> &StateContext {
        &self.ctx
    }

    pub(crate) fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) async fn enter(&mut self) -> Result<(), StateError> {
        self.state.enter(&self.ctx).await
    }

    pub(crate) async fn suspend(&mut self) -> Result<(), StateError> {
        self.state.on_suspend(&self.ctx).await?;
        self.suspended = true;
        Ok(())
    }

    pub(crate) async fn resume(&mut self) -> Result<(), StateError> {
        self.state.on_resume(&self.ctx).await?;
        self.suspended = false;
        Ok(())
    }

    pub(crate) async fn exit(&mut self) -> Result<(), StateError> {
        self.state.exit(&self.ctx).await
    }

    pub(crate) fn tick(&mut self) {
        self.state.tick(&self.ctx);
    }

    /// Tear the state down. Idempotent.
    ///
    /// Order: the state's own `on_dispose`, then token cancellation, then
    /// scope release. Work holding the token sees cancellation before the
    /// scope it depends on goes away.
    pub(crate) fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.ctx.liveness().mark_disposed();

        self.state.on_dispose();
        if self.owns_token {
            self.ctx.cancel();
        }
        let scope = self.ctx.release_scope();
        drop(scope);

        tracing::debug!(
            state = %self.ctx.name(),
            id = %self.ctx.id(),
            depth = self.ctx.depth(),
            "State disposed"
        );
        true
    }
}

impl Drop for StateSlot {
    fn drop(&mut self) {
        self.dispose();
    }
}
