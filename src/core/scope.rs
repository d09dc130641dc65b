//! Resource scopes owned by states.
//!
//! A [`Scope`] is a bundle of constructed dependencies keyed by type. Each
//! pushed state gets a child scope of its parent's, so lookups fall back to
//! ancestors: a state can resolve anything its parent (or the root) bound,
//! plus whatever its own template and push request added.

use super::error::StateError;
use super::request::StateTemplate;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Value = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct Binding {
    type_id: TypeId,
    type_name: &'static str,
    value: Value,
}

/// Ordered set of typed values to install into a new scope.
///
/// When the same type is bound twice the later value wins.
///
/// # Example
///
/// ```rust
/// use navstack::core::{Bindings, Scope};
///
/// #[derive(Debug, PartialEq)]
/// struct SelectedLaunch(&'static str);
///
/// let bindings = Bindings::new().with(SelectedLaunch("crs-20")).with(42u32);
/// let scope = Scope::root("popup").with_bindings(bindings);
///
/// assert_eq!(*scope.get::<SelectedLaunch>().unwrap(), SelectedLaunch("crs-20"));
/// assert_eq!(*scope.get::<u32>().unwrap(), 42);
/// ```
#[derive(Clone, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, returning the bindings for chaining.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.bind(value);
        self
    }

    /// Add a value in place.
    pub fn bind<T: Any + Send + Sync>(&mut self, value: T) {
        self.bind_shared(Arc::new(value));
    }

    /// Add a value that is already shared.
    pub fn bind_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.entries.push(Binding {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value,
        });
    }

    /// Append every binding from `other` after the existing ones.
    pub fn extend(&mut self, other: Bindings) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|b| b.type_name))
            .finish()
    }
}

/// Typed resource bundle with an optional parent.
pub struct Scope {
    name: String,
    values: HashMap<TypeId, (&'static str, Value)>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// Create a scope with no parent, typically for the root state.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
            parent: None,
        }
    }

    /// Create a child of `parent` containing `bindings`.
    pub fn child(parent: Arc<Scope>, name: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
            parent: Some(parent),
        }
        .with_bindings(bindings)
    }

    /// Install bindings, returning the scope for chaining.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        for binding in bindings.entries {
            self.values
                .insert(binding.type_id, (binding.type_name, binding.value));
        }
        self
    }

    /// Install a single value in this scope.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.values
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(value)));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Look up a value of type `T`, walking from this scope to the root.
    pub fn try_get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some((_, value)) = scope.values.get(&TypeId::of::<T>()) {
                return Arc::clone(value).downcast::<T>().ok();
            }
            current = scope.parent.as_deref();
        }
        None
    }

    /// Like [`Scope::try_get`] but reports which type was missing.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, StateError> {
        self.try_get::<T>().ok_or_else(|| StateError::MissingBinding {
            type_name: type_name::<T>(),
            scope: self.name.clone(),
        })
    }

    /// Resolve a value and clone it out of the scope.
    pub fn resolve<T: Any + Send + Sync + Clone>(&self) -> Result<T, StateError> {
        self.get::<T>().map(|value| (*value).clone())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.try_get::<T>().is_some()
    }

    /// Number of values bound directly in this scope (ancestors excluded).
    pub fn local_len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.values.values().map(|(name, _)| *name).collect();
        bound.sort_unstable();
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("bound", &bound)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .finish()
    }
}

/// Produces the scope a pushed state is constructed from.
///
/// The machine calls this exactly once per push. `bindings` already contains
/// the new state's cancellation token followed by the requester's extras.
pub trait ScopeProvider: Send + Sync {
    fn create_scope(
        &self,
        parent: &Arc<Scope>,
        template: &StateTemplate,
        bindings: Bindings,
    ) -> Result<Scope, StateError>;
}

/// Default provider: a child of the parent scope holding the template's own
/// bindings, overridden by the request's bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildScopeProvider;

impl ScopeProvider for ChildScopeProvider {
    fn create_scope(
        &self,
        parent: &Arc<Scope>,
        template: &StateTemplate,
        bindings: Bindings,
    ) -> Result<Scope, StateError> {
        let mut all = template.bindings().clone();
        all.extend(bindings);
        Ok(Scope::child(Arc::clone(parent), template.name(), all))
    }
}
