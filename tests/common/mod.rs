//! Shared fixtures for integration tests.
//!
//! `Probe` states append `"<name>.<Hook>"` to a shared log so tests can assert
//! the exact order in which the machine drives lifecycle hooks.

#![allow(dead_code)]

use async_trait::async_trait;
use navstack::core::{
    Bindings, ChildScopeProvider, Requester, Scope, ScopeProvider, State, StateContext,
    StateError, StateTemplate,
};
use navstack::StateMachine;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub type Log = Arc<Mutex<Vec<String>>>;

/// Tokens captured by probes on entry, keyed by state name.
pub type Tokens = Arc<Mutex<Vec<(String, CancellationToken)>>>;

#[derive(Clone, Copy, Debug, Default)]
pub struct Behaviour {
    pub fail_enter: bool,
    pub fail_exit: bool,
    pub fail_resume: bool,
}

pub struct Probe {
    name: String,
    log: Log,
    tokens: Option<Tokens>,
    behaviour: Behaviour,
}

impl Probe {
    pub fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            tokens: None,
            behaviour: Behaviour::default(),
        }
    }

    pub fn with_tokens(mut self, tokens: &Tokens) -> Self {
        self.tokens = Some(Arc::clone(tokens));
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    fn note(&self, hook: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.{}", self.name, hook));
    }
}

#[async_trait]
impl State for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enter(&mut self, ctx: &StateContext) -> Result<(), StateError> {
        self.note("Enter");
        if let Some(tokens) = &self.tokens {
            tokens
                .lock()
                .unwrap()
                .push((self.name.clone(), ctx.cancellation().clone()));
        }
        if self.behaviour.fail_enter {
            return Err(StateError::failed(&self.name, "enter failed"));
        }
        Ok(())
    }

    async fn on_suspend(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        self.note("OnSuspend");
        Ok(())
    }

    async fn on_resume(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        self.note("OnResume");
        if self.behaviour.fail_resume {
            return Err(StateError::failed(&self.name, "resume failed"));
        }
        Ok(())
    }

    async fn exit(&mut self, _ctx: &StateContext) -> Result<(), StateError> {
        self.note("Exit");
        if self.behaviour.fail_exit {
            return Err(StateError::failed(&self.name, "exit failed"));
        }
        Ok(())
    }

    fn on_dispose(&mut self) {
        self.note("Dispose");
    }
}

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn new_tokens() -> Tokens {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn clear(log: &Log) {
    log.lock().unwrap().clear();
}

pub fn probe(name: &'static str, log: &Log) -> StateTemplate {
    probe_with(name, log, Behaviour::default())
}

pub fn probe_with(name: &'static str, log: &Log, behaviour: Behaviour) -> StateTemplate {
    let log = Arc::clone(log);
    StateTemplate::new(name, move |_scope: &Scope| {
        Ok(Probe::new(name, &log).with_behaviour(behaviour))
    })
}

pub fn tracked_probe(name: &'static str, log: &Log, tokens: &Tokens) -> StateTemplate {
    let log = Arc::clone(log);
    let tokens = Arc::clone(tokens);
    StateTemplate::new(name, move |_scope: &Scope| {
        Ok(Probe::new(name, &log).with_tokens(&tokens))
    })
}

/// A template whose factory always fails, as if a dependency were missing.
pub fn unbuildable(name: &'static str) -> StateTemplate {
    StateTemplate::new(name, |scope: &Scope| {
        scope.get::<MissingDependency>()?;
        Ok(Unreachable)
    })
}

pub struct MissingDependency;

struct Unreachable;

#[async_trait]
impl State for Unreachable {
    fn name(&self) -> &str {
        "Unreachable"
    }
}

/// Start a machine whose root is a probe named "A".
pub async fn start(machine: &mut StateMachine, log: &Log) -> CancellationToken {
    let app = CancellationToken::new();
    machine
        .push_first(Probe::new("A", log), Scope::root("A"), app.clone())
        .await
        .unwrap();
    app
}

pub fn top_requester(machine: &StateMachine) -> Requester {
    machine.top_context().unwrap().requester()
}

/// Logs, on drop, whether the owning state's token had fired.
pub struct ReleaseWitness {
    name: String,
    token: Option<CancellationToken>,
    log: Log,
}

impl Drop for ReleaseWitness {
    fn drop(&mut self) {
        let cancelled = self.token.as_ref().is_some_and(|t| t.is_cancelled());
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{}.ScopeReleased(cancelled={})", self.name, cancelled));
        }
    }
}

/// Wraps the default provider and plants a [`ReleaseWitness`] in each scope.
pub struct WitnessProvider {
    pub log: Log,
}

impl ScopeProvider for WitnessProvider {
    fn create_scope(
        &self,
        parent: &Arc<Scope>,
        template: &StateTemplate,
        bindings: Bindings,
    ) -> Result<Scope, StateError> {
        let mut scope = ChildScopeProvider.create_scope(parent, template, bindings)?;
        let token = scope.try_get::<CancellationToken>().map(|t| (*t).clone());
        scope.insert(ReleaseWitness {
            name: template.name().to_string(),
            token,
            log: Arc::clone(&self.log),
        });
        Ok(scope)
    }
}
