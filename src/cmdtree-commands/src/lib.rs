//! Command tree engine for cmdtree.
//!
//! This crate builds a hierarchical command tree from independently authored
//! modules, extracts each command's documentation and argument contract from
//! its annotation block, and drives invocations through prompting, validation,
//! lifecycle hooks and the command's handler.
//!
//! # Annotation Blocks
//!
//! Every command carries free-form documentation:
//!
//! ```text
//! Rock out with the configured volume.
//!
//! ## OPTIONS
//!
//! [--volume=<number>]
//! : How loud to rock.
//!
//! @synopsis [--volume=<number>]
//! @alias rock
//! ```
//!
//! The first paragraph is the short description, everything up to the first
//! tag line is the long description, and `@tag value` lines are metadata.
//!
//! # Registration
//!
//! Modules expose an explicit list of handler entries:
//!
//! ```rust
//! use cmdtree_commands::{AssocArgs, CommandModule, HandlerEntry, Implementation, CommandManager};
//!
//! struct Music;
//!
//! impl CommandModule for Music {
//!     fn doc(&self) -> &str {
//!         "Play music."
//!     }
//!
//!     fn entries(&self) -> Vec<HandlerEntry> {
//!         vec![HandlerEntry::new(
//!             "rock_on",
//!             "Rock out.\n\n@synopsis [--volume=<number>]",
//!             |_args: &[String], _assoc: &AssocArgs| 0,
//!         )]
//!     }
//! }
//!
//! let mut manager = CommandManager::default();
//! manager.register(&["music"], Implementation::module(Music)).unwrap();
//!
//! let status = manager.dispatch(vec!["music".into(), "rock-on".into()], AssocArgs::new());
//! assert_eq!(status, 0);
//! ```
//!
//! # Hooks
//!
//! Subscribers registered through [`CommandManager::hooks_mut`] observe
//! `before_invoke:<parent path>`, `before_invoke:<command path>` and
//! `after_invoke:<command path>`.

pub mod args;
pub mod config;
pub mod dispatcher;
pub mod docblock;
pub mod error;
pub mod help;
pub mod invoke;
pub mod loader;
pub mod manager;
pub mod module;
pub mod output;
pub mod synopsis;
pub mod tree;
pub mod validator;

pub use args::{AssocArgs, AssocValue, SplitArgs, split_tokens};
pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, Resolution};
pub use docblock::DocBlock;
pub use error::{CommandError, DispatchError, InvokeError, TreeError};
pub use help::NodeSummary;
pub use invoke::{
    InvocationEngine, NoPrompter, PromptStrategy, Prompter, ScriptedPrompter, Stage, prompt_args,
};
pub use loader::{DeferredModules, LazyLoader};
pub use manager::CommandManager;
pub use module::{CommandModule, Handler, HandlerEntry, Implementation, command_name};
pub use output::{CapturedOutput, Output, StdOutput};
pub use synopsis::{ArgKind, ArgSpec, ValueSpec};
pub use tree::{CommandNode, CommandTree, LeafCommand, NodeId, NodeKind};
pub use validator::{ArgIssue, SynopsisValidator, ValidationResult};

pub use cmdtree_hooks as hooks;
