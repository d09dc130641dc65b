//! Navstack: a hierarchical push/pop state machine
//!
//! Navstack drives application flow as a stack of states. The top state is
//! active and ticked every frame; states below it are suspended but alive.
//! Each state owns a typed resource scope and a cancellation token derived
//! from the application's, so popping a state (or quitting) aborts the work
//! it started before the resources that work depends on are released.
//!
//! # Core Concepts
//!
//! - **State**: Lifecycle trait (`enter`, `on_suspend`, `on_resume`, `exit`, `tick`)
//! - **Scope**: Typed dependency bundle, child of the parent state's scope
//! - **TransitionRequest**: Push a `StateTemplate` or pop, queued by a state
//! - **StateMachine**: Owns the stack and handles requests one at a time
//! - **TransitionPolicy**: Validation rules checked before every push
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use navstack::builder::StateMachineBuilder;
//! use navstack::core::{Bindings, Scope, State, StateContext, StateError, StateTemplate};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Root {
//!     popup: StateTemplate,
//! }
//!
//! #[async_trait]
//! impl State for Root {
//!     fn name(&self) -> &str {
//!         "Root"
//!     }
//!
//!     async fn enter(&mut self, ctx: &StateContext) -> Result<(), StateError> {
//!         // Hand the selected record to the child through its scope.
//!         ctx.request_push_with(self.popup.clone(), Bindings::new().with(String::from("crs-20")));
//!         Ok(())
//!     }
//! }
//!
//! struct Popup {
//!     launch: String,
//! }
//!
//! #[async_trait]
//! impl State for Popup {
//!     fn name(&self) -> &str {
//!         "Popup"
//!     }
//! }
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let popup = StateTemplate::new("Popup", |scope: &Scope| {
//!     Ok(Popup { launch: scope.resolve::<String>()? })
//! });
//!
//! let mut machine = StateMachineBuilder::new().label("demo").build().unwrap();
//! machine
//!     .push_first(Root { popup }, Scope::root("root"), CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert_eq!(machine.top_name(), Some("Popup"));
//!
//! machine.pop().await.unwrap();
//! assert_eq!(machine.state_names(), vec!["Root"]);
//! # });
//! ```

pub mod builder;
pub mod core;
pub mod enforcement;
pub mod machine;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{MachineConfig, StateMachineBuilder};
pub use core::{Bindings, Scope, State, StateContext, StateError, StateId, StateTemplate};
pub use machine::{MachineEvent, StateMachine, TransitionError};
