//! Command manager.
//!
//! Owns the command tree and every collaborator an invocation needs. One
//! manager is built at startup and passed by reference to whatever drives it.

use std::collections::HashSet;

use cmdtree_hooks::HookExecutor;
use tracing::debug;

use crate::args::AssocArgs;
use crate::config::DispatchConfig;
use crate::dispatcher::{Dispatcher, Resolution};
use crate::docblock::DocBlock;
use crate::error::{CommandError, DispatchError, InvokeError, TreeError};
use crate::invoke::{InvocationEngine, NoPrompter, Prompter};
use crate::loader::LazyLoader;
use crate::module::Implementation;
use crate::output::{Output, StdOutput};
use crate::tree::{CommandTree, NodeId};

/// Context object tying the tree to resolution and invocation.
pub struct CommandManager {
    tree: CommandTree,
    hooks: HookExecutor,
    loader: Option<Box<dyn LazyLoader>>,
    config: DispatchConfig,
    prompter: Box<dyn Prompter>,
    output: Box<dyn Output>,
    /// Leaves whose synopsis problems were already reported.
    reported_synopsis: HashSet<NodeId>,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl CommandManager {
    /// Create a manager with an empty tree rooted at `config.root_name`.
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            tree: CommandTree::new(config.root_name.clone()),
            hooks: HookExecutor::new(),
            loader: None,
            config,
            prompter: Box::new(NoPrompter),
            output: Box::new(StdOutput),
            reported_synopsis: HashSet::new(),
        }
    }

    /// Attach an annotation block to the root command.
    pub fn with_root_doc(mut self, doc: &str) -> Self {
        self.tree.set_root_doc(DocBlock::parse(doc));
        self
    }

    pub fn with_loader(mut self, loader: impl LazyLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    pub fn with_output(mut self, output: impl Output + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DispatchConfig {
        &mut self.config
    }

    /// Subscription point for lifecycle hooks.
    pub fn hooks_mut(&mut self) -> &mut HookExecutor {
        &mut self.hooks
    }

    /// Register `implementation` at `path`.
    pub fn register(
        &mut self,
        path: &[&str],
        implementation: Implementation,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.tree.register(path, implementation)
    }

    /// Resolve tokens to a node, loading deferred modules on the way.
    pub fn resolve(&mut self, tokens: Vec<String>) -> Result<Resolution, DispatchError> {
        let mut dispatcher =
            Dispatcher::new().with_suggestion_distance(self.config.suggestion_distance);
        if let Some(loader) = self.loader.as_deref_mut() {
            dispatcher = dispatcher.with_loader(loader);
        }
        dispatcher.resolve(&mut self.tree, tokens)
    }

    /// Help page for the node reached by `tokens`.
    pub fn help(&mut self, tokens: Vec<String>) -> Result<String, DispatchError> {
        let resolution = self.resolve(tokens)?;
        Ok(self.tree.render_help(resolution.node()))
    }

    /// Resolve and invoke, returning the handler status or the first error.
    pub fn try_dispatch(
        &mut self,
        mut tokens: Vec<String>,
        assoc: AssocArgs,
    ) -> Result<i32, CommandError> {
        if self.is_help_request(&tokens) {
            tokens.remove(0);
            let page = self.help(tokens)?;
            for line in page.lines() {
                self.output.line(line);
            }
            return Ok(0);
        }

        match self.resolve(tokens)? {
            Resolution::Help { node } => {
                debug!("Showing usage for {}", self.tree.full_path(node));
                for line in self.tree.show_usage(node) {
                    self.output.line(&line);
                }
                Ok(0)
            }
            Resolution::Leaf { node, args } => {
                let mut engine = InvocationEngine {
                    tree: &self.tree,
                    hooks: &mut self.hooks,
                    prompter: &mut *self.prompter,
                    output: &mut *self.output,
                    config: &self.config,
                    reported: &mut self.reported_synopsis,
                };
                Ok(engine.invoke(node, args, assoc)?)
            }
        }
    }

    /// Resolve and invoke, returning a process exit status.
    ///
    /// Errors are reported through the output collaborator and yield 1.
    pub fn dispatch(&mut self, tokens: Vec<String>, assoc: AssocArgs) -> i32 {
        match self.try_dispatch(tokens, assoc) {
            Ok(status) => status,
            Err(err) => {
                self.output.error(&err.to_string());
                if let CommandError::Invoke(InvokeError::InvalidArguments { usage, .. }) = &err {
                    for line in usage {
                        self.output.line(line);
                    }
                }
                1
            }
        }
    }

    fn is_help_request(&self, tokens: &[String]) -> bool {
        self.config.builtin_help
            && tokens.first().is_some_and(|t| t == "help")
            && self.tree.lookup_child(self.tree.root(), "help").is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AssocValue;
    use crate::invoke::ScriptedPrompter;
    use crate::module::HandlerEntry;
    use crate::output::CapturedOutput;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn manager(output: &CapturedOutput) -> CommandManager {
        let mut manager = CommandManager::default().with_output(output.clone());
        manager
            .register(
                &["music", "rock-on"],
                Implementation::Single(HandlerEntry::new(
                    "rock_on",
                    "Rock out.\n\n## OPTIONS\n\n--volume=<number>\n: How loud.\n\n@synopsis --volume=<number>",
                    |_, assoc: &AssocArgs| {
                        if assoc.get("volume") == Some(&AssocValue::from("0")) {
                            3
                        } else {
                            0
                        }
                    },
                )),
            )
            .unwrap();
        manager
    }

    #[test]
    fn test_dispatch_success_and_handler_status() {
        let output = CapturedOutput::new();
        let mut manager = manager(&output);

        let mut assoc = AssocArgs::new();
        assoc.insert("volume".to_string(), "11".into());
        assert_eq!(manager.dispatch(tokens(&["music", "rock-on"]), assoc), 0);

        let mut assoc = AssocArgs::new();
        assoc.insert("volume".to_string(), "0".into());
        assert_eq!(manager.dispatch(tokens(&["music", "rock-on"]), assoc), 3);
        assert!(output.errors().is_empty());
    }

    #[test]
    fn test_fatal_validation_reports_usage() {
        let output = CapturedOutput::new();
        let mut manager = manager(&output);

        let status = manager.dispatch(tokens(&["music", "rock-on"]), AssocArgs::new());

        assert_eq!(status, 1);
        assert_eq!(
            output.errors(),
            vec!["Parameter errors:\n missing --volume parameter (How loud.)".to_string()]
        );
        assert_eq!(
            output.lines(),
            vec!["usage: cmdtree music rock-on --volume=<number>".to_string()]
        );
    }

    #[test]
    fn test_unknown_command_status() {
        let output = CapturedOutput::new();
        let mut manager = manager(&output);

        assert_eq!(manager.dispatch(tokens(&["musik"]), AssocArgs::new()), 1);
        assert_eq!(
            output.errors(),
            vec!["'musik' is not a registered cmdtree command. Did you mean 'music'?".to_string()]
        );
    }

    #[test]
    fn test_composite_shows_usage() {
        let output = CapturedOutput::new();
        let mut manager = manager(&output);

        assert_eq!(manager.dispatch(tokens(&["music"]), AssocArgs::new()), 0);
        assert_eq!(
            output.lines()[0],
            "usage: cmdtree music rock-on --volume=<number>"
        );
    }

    #[test]
    fn test_builtin_help() {
        let output = CapturedOutput::new();
        let mut manager = manager(&output);

        assert_eq!(
            manager.dispatch(tokens(&["help", "music", "rock-on"]), AssocArgs::new()),
            0
        );
        assert_eq!(output.lines()[0], "NAME");
        assert!(output.lines().contains(&"  cmdtree music rock-on".to_string()));
    }

    #[test]
    fn test_prompting_feeds_validation() {
        let output = CapturedOutput::new();
        let seen = Rc::new(RefCell::new(None));
        let recorder = Rc::clone(&seen);

        let mut manager = CommandManager::default()
            .with_output(output.clone())
            .with_prompter(ScriptedPrompter::new(["7"]));
        manager
            .register(
                &["volume"],
                Implementation::Single(
                    HandlerEntry::new("volume", "@synopsis --level=<n>", move |_, assoc| {
                        *recorder.borrow_mut() = assoc.get("level").cloned();
                        0
                    })
                    .with_prompt(true),
                ),
            )
            .unwrap();

        assert_eq!(manager.dispatch(tokens(&["volume"]), AssocArgs::new()), 0);
        assert_eq!(*seen.borrow(), Some(AssocValue::from("7")));
    }

    #[test]
    fn test_root_doc_keeps_registered_commands() {
        let output = CapturedOutput::new();
        let manager = manager(&output).with_root_doc("Manage music.");

        let root = manager.tree().root();
        assert_eq!(manager.tree().node(root).shortdesc(), "Manage music.");
        assert!(manager.tree().lookup_child(root, "music").is_some());
    }
}
