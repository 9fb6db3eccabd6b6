//! Lifecycle hook registry for cmdtree.
//!
//! Hooks are named events that external collaborators subscribe to before
//! any command is dispatched. The command engine emits:
//!
//! - `before_invoke:<parent path>` when the invoked leaf sits below a composite
//! - `before_invoke:<command path>` right before a handler runs
//! - `after_invoke:<command path>` after a handler returned success
//!
//! Subscriptions use glob syntax for the event name, so `before_invoke:*`
//! observes every invocation.
//!
//! # Once Hooks
//!
//! Hooks can be configured to execute only once per executor using the
//! `once()` builder method. Subsequent emissions report them as skipped.
//!
//! # Example
//!
//! ```rust
//! use cmdtree_hooks::{Hook, HookContext, HookExecutor};
//!
//! let mut executor = HookExecutor::new();
//! executor
//!     .register(Hook::new("audit", "before_invoke:*", |ctx: &HookContext| {
//!         println!("about to run {}", ctx.command.as_deref().unwrap_or(""));
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let results = executor.emit(&HookContext::new("before_invoke:db export"));
//! assert_eq!(results.len(), 1);
//! ```

pub mod executor;
pub mod hook;

pub use executor::HookExecutor;
pub use hook::{Hook, HookCallback, HookContext, HookResult, HookStatus};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Hook already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Hook not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, HookError>;
