//! Registration of command modules.
//!
//! A module is an explicit list of named handler entries. Each entry carries
//! its annotation block; the tree derives the command name, alias and synopsis
//! from it at registration time.

use std::collections::HashSet;

use tracing::debug;

use crate::args::AssocArgs;
use crate::docblock::DocBlock;
use crate::error::TreeError;
use crate::synopsis;
use crate::tree::{CommandTree, LeafCommand, NodeId};

/// The callable bound to a leaf command.
pub trait Handler {
    /// Run the command and return its exit status.
    fn invoke(&self, args: &[String], assoc: &AssocArgs) -> i32;
}

impl<F> Handler for F
where
    F: Fn(&[String], &AssocArgs) -> i32,
{
    fn invoke(&self, args: &[String], assoc: &AssocArgs) -> i32 {
        self(args, assoc)
    }
}

/// One named operation exposed by a module.
pub struct HandlerEntry {
    /// Identifier the command name is derived from.
    pub ident: String,
    /// Raw annotation block.
    pub doc: String,
    pub prompt: bool,
    handler: Box<dyn Handler>,
}

impl HandlerEntry {
    pub fn new<F>(ident: impl Into<String>, doc: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String], &AssocArgs) -> i32 + 'static,
    {
        Self::from_handler(ident, doc, handler)
    }

    pub fn from_handler(
        ident: impl Into<String>,
        doc: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            ident: ident.into(),
            doc: doc.into(),
            prompt: false,
            handler: Box::new(handler),
        }
    }

    /// Ask for missing arguments interactively before validation.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("ident", &self.ident)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// A set of commands registered together under one composite.
pub trait CommandModule {
    /// Annotation block of the composite itself.
    fn doc(&self) -> &str {
        ""
    }

    /// The module's operations, in declaration order.
    fn entries(&self) -> Vec<HandlerEntry>;
}

/// What gets registered at a path.
pub enum Implementation {
    /// A composite whose leaves are the module's entries.
    Module(Box<dyn CommandModule>),
    /// A single leaf named after the last path component.
    Single(HandlerEntry),
}

impl Implementation {
    pub fn module(module: impl CommandModule + 'static) -> Self {
        Self::Module(Box::new(module))
    }
}

/// Derive a command name from an operation identifier.
///
/// Identifiers starting with `_` are not commands. A `@subcommand` tag wins;
/// otherwise trailing underscores are dropped and `_` becomes `-`.
pub fn command_name(ident: &str, doc: &DocBlock) -> Option<String> {
    if ident.starts_with('_') {
        return None;
    }
    let explicit = doc.get_tag("subcommand").trim();
    if !explicit.is_empty() {
        return Some(explicit.to_string());
    }
    let name = ident.trim_end_matches('_').replace('_', "-");
    (!name.is_empty()).then_some(name)
}

struct PreparedLeaf {
    name: String,
    doc: DocBlock,
    leaf: LeafCommand,
}

fn prepare(entry: HandlerEntry, name: String) -> PreparedLeaf {
    let doc = DocBlock::parse(&entry.doc);
    let alias = Some(doc.get_tag("alias").trim())
        .filter(|alias| !alias.is_empty())
        .map(str::to_string);
    let leaf = LeafCommand::new(synopsis::parse(doc.synopsis()), entry.handler)
        .with_alias(alias)
        .with_prompt(entry.prompt);
    PreparedLeaf { name, doc, leaf }
}

impl CommandTree {
    /// Register `implementation` at `path`, creating missing composites.
    ///
    /// Returns the ids of the leaves that were added.
    pub fn register(
        &mut self,
        path: &[&str],
        implementation: Implementation,
    ) -> Result<Vec<NodeId>, TreeError> {
        match implementation {
            Implementation::Single(entry) => {
                let (name, parents) = path.split_last().ok_or(TreeError::EmptyPath)?;
                let prepared = prepare(entry, name.to_string());
                let alias = prepared.leaf.alias.as_deref();
                match self.find_path(parents)? {
                    Some(parent) => self.check_insert(parent, name, alias)?,
                    None if alias == Some(*name) => {
                        return Err(TreeError::AliasCollision {
                            parent: self.display_path(parents),
                            name: name.to_string(),
                            alias: name.to_string(),
                        });
                    }
                    None => {}
                }

                let parent = self.ensure_path(parents)?;
                let id = self.add_leaf(parent, &prepared.name, prepared.doc, prepared.leaf)?;
                Ok(vec![id])
            }
            Implementation::Module(module) => {
                let doc = DocBlock::parse(module.doc());
                let mut prepared = Vec::new();
                let mut seen = HashSet::new();
                for entry in module.entries() {
                    let entry_doc = DocBlock::parse(&entry.doc);
                    let Some(name) = command_name(&entry.ident, &entry_doc) else {
                        debug!("Skipping non-command entry {}", entry.ident);
                        continue;
                    };
                    if !seen.insert(name.clone()) {
                        return Err(TreeError::DuplicateInModule {
                            path: path.join(" "),
                            name,
                        });
                    }
                    prepared.push(prepare(entry, name));
                }

                // Check every entry before the tree is touched.
                let existing = self.find_path(path)?;
                let mut aliases = HashSet::new();
                for item in &prepared {
                    if let Some(parent) = existing {
                        self.check_insert(parent, &item.name, item.leaf.alias.as_deref())?;
                    }
                    if let Some(alias) = &item.leaf.alias
                        && (seen.contains(alias) || !aliases.insert(alias.clone()))
                    {
                        return Err(TreeError::AliasCollision {
                            parent: self.display_path(path),
                            name: item.name.clone(),
                            alias: alias.clone(),
                        });
                    }
                }

                let parent = self.ensure_path(path)?;
                self.fill_doc(parent, doc);
                prepared
                    .into_iter()
                    .map(|item| self.add_leaf(parent, &item.name, item.doc, item.leaf))
                    .collect()
            }
        }
    }

    /// Full path of a node that may not exist yet.
    fn display_path(&self, path: &[&str]) -> String {
        std::iter::once(self.node(self.root()).name())
            .chain(path.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn ensure_path(&mut self, path: &[&str]) -> Result<NodeId, TreeError> {
        let mut current = self.root();
        for name in path {
            current = self.ensure_composite(current, name)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Db;

    impl CommandModule for Db {
        fn doc(&self) -> &str {
            "Database tools."
        }

        fn entries(&self) -> Vec<HandlerEntry> {
            vec![
                HandlerEntry::new(
                    "export_",
                    "Export the database.\n\n@synopsis <file> [--tables=<tables>]",
                    |_, _| 0,
                ),
                HandlerEntry::new("query", "Run a query.\n\n@alias q", |_, _| 0),
                HandlerEntry::new("_helper", "", |_, _| 0),
                HandlerEntry::new("do_stuff", "Rename.\n\n@subcommand stuff", |_, _| 0),
            ]
        }
    }

    #[test]
    fn test_command_name() {
        let empty = DocBlock::default();

        assert_eq!(command_name("list_", &empty).as_deref(), Some("list"));
        assert_eq!(command_name("export_all", &empty).as_deref(), Some("export-all"));
        assert_eq!(command_name("_private", &empty), None);
        assert_eq!(
            command_name("anything", &DocBlock::parse("@subcommand custom")).as_deref(),
            Some("custom")
        );
    }

    #[test]
    fn test_register_module() {
        let mut tree = CommandTree::new("cmdtree");
        let leaves = tree.register(&["db"], Implementation::module(Db)).unwrap();

        assert_eq!(leaves.len(), 3);
        let db = tree.lookup_child(tree.root(), "db").unwrap();
        assert_eq!(tree.node(db).shortdesc(), "Database tools.");

        let names: Vec<&str> = tree
            .get_subcommands(db)
            .into_iter()
            .map(|id| tree.node(id).name())
            .collect();
        assert_eq!(names, vec!["export", "query", "stuff"]);

        let export = tree.lookup_child(db, "export").unwrap();
        let synopsis = &tree.node(export).leaf().unwrap().synopsis;
        assert_eq!(synopsis::render(synopsis), "<file> [--tables=<tables>]");
        assert_eq!(tree.lookup_child(db, "q"), tree.lookup_child(db, "query"));
    }

    #[test]
    fn test_register_creates_intermediate_composites() {
        let mut tree = CommandTree::new("cmdtree");
        let entry = HandlerEntry::new("ignored", "Deep command.", |_, _| 0).with_prompt(true);

        let leaves = tree
            .register(&["a", "b", "deep"], Implementation::Single(entry))
            .unwrap();

        assert_eq!(tree.full_path(leaves[0]), "cmdtree a b deep");
        assert!(tree.node(leaves[0]).leaf().unwrap().prompt_enabled);
        assert!(!tree.node(tree.node(leaves[0]).parent().unwrap()).is_leaf());
    }

    #[test]
    fn test_register_extends_existing_composite() {
        let mut tree = CommandTree::new("cmdtree");
        tree.register(&["db"], Implementation::module(Db)).unwrap();
        tree.register(
            &["db", "size"],
            Implementation::Single(HandlerEntry::new("size", "Size.", |_, _| 0)),
        )
        .unwrap();

        let db = tree.lookup_child(tree.root(), "db").unwrap();
        assert_eq!(tree.get_subcommands(db).len(), 4);
    }

    #[test]
    fn test_register_errors() {
        let mut tree = CommandTree::new("cmdtree");
        tree.register(&["db"], Implementation::module(Db)).unwrap();
        let before = tree.len();

        assert!(matches!(
            tree.register(&["db"], Implementation::module(Db)),
            Err(TreeError::DuplicateName { .. })
        ));
        assert!(matches!(
            tree.register(
                &["db", "export", "x"],
                Implementation::Single(HandlerEntry::new("x", "", |_, _| 0))
            ),
            Err(TreeError::ParentIsLeaf { .. })
        ));
        assert_eq!(
            tree.register(&[], Implementation::Single(HandlerEntry::new("x", "", |_, _| 0))),
            Err(TreeError::EmptyPath)
        );
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_duplicate_inside_module() {
        struct Twice;
        impl CommandModule for Twice {
            fn entries(&self) -> Vec<HandlerEntry> {
                vec![
                    HandlerEntry::new("list", "", |_, _| 0),
                    HandlerEntry::new("list_", "", |_, _| 0),
                ]
            }
        }

        let mut tree = CommandTree::new("cmdtree");
        assert_eq!(
            tree.register(&["t"], Implementation::module(Twice)),
            Err(TreeError::DuplicateInModule {
                path: "t".to_string(),
                name: "list".to_string()
            })
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_failed_register_leaves_tree_untouched() {
        let mut tree = CommandTree::new("cmdtree");
        let before = tree.len();

        let err = tree
            .register(
                &["fresh", "leaf"],
                Implementation::Single(HandlerEntry::new("leaf", "Leaf.\n\n@alias leaf", |_, _| 0)),
            )
            .unwrap_err();

        assert_eq!(
            err,
            TreeError::AliasCollision {
                parent: "cmdtree fresh".to_string(),
                name: "leaf".to_string(),
                alias: "leaf".to_string(),
            }
        );
        assert_eq!(tree.len(), before);
        assert!(tree.lookup_child(tree.root(), "fresh").is_none());
    }

    #[test]
    fn test_failed_module_register_creates_no_composite() {
        struct SharedAlias;
        impl CommandModule for SharedAlias {
            fn doc(&self) -> &str {
                "Play music."
            }

            fn entries(&self) -> Vec<HandlerEntry> {
                vec![
                    HandlerEntry::new("one", "@alias x", |_, _| 0),
                    HandlerEntry::new("two", "@alias x", |_, _| 0),
                ]
            }
        }

        let mut tree = CommandTree::new("cmdtree");
        assert!(matches!(
            tree.register(&["music", "deep"], Implementation::module(SharedAlias)),
            Err(TreeError::AliasCollision { .. })
        ));
        assert_eq!(tree.len(), 1);

        tree.register(&["db"], Implementation::module(Db)).unwrap();
        let before = tree.len();
        assert!(matches!(
            tree.register(
                &["db", "q", "x"],
                Implementation::Single(HandlerEntry::new("x", "", |_, _| 0))
            ),
            Err(TreeError::AliasCollision { .. })
        ));
        assert_eq!(tree.len(), before);
    }
}
