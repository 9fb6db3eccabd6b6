//! Resolution of raw tokens to a command node.

use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::loader::LazyLoader;
use crate::tree::{CommandTree, NodeId};

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A leaf was reached; the remaining tokens are its positional arguments.
    Leaf { node: NodeId, args: Vec<String> },
    /// Tokens ran out at a composite.
    Help { node: NodeId },
}

impl Resolution {
    pub fn node(&self) -> NodeId {
        match self {
            Self::Leaf { node, .. } | Self::Help { node } => *node,
        }
    }
}

/// Walks the command tree one token at a time.
pub struct Dispatcher<'a> {
    loader: Option<&'a mut dyn LazyLoader>,
    suggestion_distance: usize,
}

impl Default for Dispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new() -> Self {
        Self {
            loader: None,
            suggestion_distance: 2,
        }
    }

    pub fn with_loader(mut self, loader: &'a mut dyn LazyLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Maximum edit distance for "did you mean" suggestions. Zero disables them.
    pub fn with_suggestion_distance(mut self, distance: usize) -> Self {
        self.suggestion_distance = distance;
        self
    }

    /// Resolve `tokens` starting at the root.
    pub fn resolve(
        &mut self,
        tree: &mut CommandTree,
        tokens: Vec<String>,
    ) -> Result<Resolution, DispatchError> {
        let mut args = tokens;
        let mut current = tree.root();

        loop {
            if tree.node(current).is_leaf() {
                debug!("Resolved {}", tree.full_path(current));
                return Ok(Resolution::Leaf {
                    node: current,
                    args,
                });
            }
            if args.is_empty() {
                debug!("Resolved {} without subcommand", tree.full_path(current));
                return Ok(Resolution::Help { node: current });
            }

            if let Some(child) = tree.find_subcommand(current, &mut args) {
                current = child;
                continue;
            }

            // One chance for the loader per unresolved component.
            let token = args[0].clone();
            if let Some(loader) = self.loader.as_deref_mut() {
                if loader.load(tree, current, &token)? {
                    if let Some(child) = tree.find_subcommand(current, &mut args) {
                        current = child;
                        continue;
                    }
                    warn!(
                        "Lazy loader reported '{}' as loaded under {} but it is still missing",
                        token,
                        tree.full_path(current)
                    );
                }
            }

            return Err(self.unknown(tree, current, token));
        }
    }

    fn unknown(&self, tree: &CommandTree, parent: NodeId, token: String) -> DispatchError {
        let suggestion = self.suggest(tree, parent, &token);
        let path = tree.full_path(parent);
        if parent == tree.root() {
            DispatchError::UnknownCommand {
                token,
                path,
                suggestion,
            }
        } else {
            DispatchError::UnknownSubcommand {
                token,
                path,
                suggestion,
            }
        }
    }

    fn suggest(&self, tree: &CommandTree, parent: NodeId, token: &str) -> Option<String> {
        if self.suggestion_distance == 0 {
            return None;
        }
        tree.child_names(parent)
            .map(|name| (strsim::levenshtein(token, name), name))
            .filter(|(distance, _)| *distance <= self.suggestion_distance)
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, name)| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DeferredModules;
    use crate::module::{HandlerEntry, Implementation};

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> CommandTree {
        let mut tree = CommandTree::new("cmdtree");
        tree.register(
            &["db", "export"],
            Implementation::Single(HandlerEntry::new("export", "@synopsis <file>", |_, _| 0)),
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_resolve_leaf_with_args() {
        let mut tree = tree();
        let resolution = Dispatcher::new()
            .resolve(&mut tree, tokens(&["db", "export", "out.sql", "extra"]))
            .unwrap();

        match resolution {
            Resolution::Leaf { node, args } => {
                assert_eq!(tree.full_path(node), "cmdtree db export");
                assert_eq!(args, tokens(&["out.sql", "extra"]));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_composite_without_tokens_is_help() {
        let mut tree = tree();
        let db = tree.lookup_child(tree.root(), "db").unwrap();

        let resolution = Dispatcher::new().resolve(&mut tree, tokens(&["db"])).unwrap();
        assert_eq!(resolution, Resolution::Help { node: db });

        let resolution = Dispatcher::new().resolve(&mut tree, Vec::new()).unwrap();
        assert_eq!(resolution.node(), tree.root());
    }

    #[test]
    fn test_unknown_command_and_subcommand() {
        let mut tree = tree();

        let err = Dispatcher::new()
            .resolve(&mut tree, tokens(&["dv", "export"]))
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownCommand {
                token: "dv".to_string(),
                path: "cmdtree".to_string(),
                suggestion: Some("db".to_string()),
            }
        );

        let err = Dispatcher::new()
            .with_suggestion_distance(0)
            .resolve(&mut tree, tokens(&["db", "exprot"]))
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownSubcommand {
                token: "exprot".to_string(),
                path: "cmdtree db".to_string(),
                suggestion: None,
            }
        );
    }

    #[test]
    fn test_lazy_loading() {
        let mut tree = tree();
        let root = tree.root();
        tree.ensure_composite(root, "music").unwrap();

        let mut loader = DeferredModules::new();
        loader.defer(&["music", "stop"], || {
            Implementation::Single(HandlerEntry::new("stop", "Stop.", |_, _| 0))
        });

        let resolution = Dispatcher::new()
            .with_loader(&mut loader)
            .resolve(&mut tree, tokens(&["music", "stop", "now"]))
            .unwrap();

        match resolution {
            Resolution::Leaf { node, args } => {
                assert_eq!(tree.full_path(node), "cmdtree music stop");
                assert_eq!(args, tokens(&["now"]));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert!(loader.is_empty());
    }

    #[test]
    fn test_loader_miss_leaves_tree_untouched() {
        let mut tree = tree();
        let before = tree.len();
        let mut loader = DeferredModules::new();

        let err = Dispatcher::new()
            .with_loader(&mut loader)
            .resolve(&mut tree, tokens(&["nosuch", "thing"]))
            .unwrap_err();

        assert_eq!(err.token(), Some("nosuch"));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_failed_deferred_module_is_not_retried() {
        use crate::error::TreeError;
        use crate::module::CommandModule;

        struct Broken;
        impl CommandModule for Broken {
            fn entries(&self) -> Vec<HandlerEntry> {
                vec![
                    HandlerEntry::new("one", "@alias x", |_, _| 0),
                    HandlerEntry::new("two", "@alias x", |_, _| 0),
                ]
            }
        }

        let mut tree = tree();
        let before = tree.len();
        let mut loader = DeferredModules::new();
        loader.defer(&["music"], || Implementation::module(Broken));

        let err = Dispatcher::new()
            .with_loader(&mut loader)
            .resolve(&mut tree, tokens(&["music", "one"]))
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Registration(TreeError::AliasCollision { .. })
        ));
        assert_eq!(tree.len(), before);

        let err = Dispatcher::new()
            .with_loader(&mut loader)
            .resolve(&mut tree, tokens(&["music"]))
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand { .. }));
        assert_eq!(tree.len(), before);
    }
}
