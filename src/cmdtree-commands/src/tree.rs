//! Command tree.
//!
//! Nodes live in an arena owned by [`CommandTree`] and refer to each other by
//! [`NodeId`]. The root is created with the tree and is always a composite.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::args::AssocArgs;
use crate::docblock::DocBlock;
use crate::error::TreeError;
use crate::module::Handler;
use crate::synopsis::ArgSpec;

/// Stable index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Invokable part of a leaf node.
pub struct LeafCommand {
    pub synopsis: Vec<ArgSpec>,
    pub alias: Option<String>,
    pub prompt_enabled: bool,
    handler: Box<dyn Handler>,
}

impl LeafCommand {
    pub fn new(synopsis: Vec<ArgSpec>, handler: Box<dyn Handler>) -> Self {
        Self {
            synopsis,
            alias: None,
            prompt_enabled: false,
            handler,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_prompt(mut self, prompt_enabled: bool) -> Self {
        self.prompt_enabled = prompt_enabled;
        self
    }

    /// Run the handler and return its status.
    pub fn invoke(&self, args: &[String], assoc: &AssocArgs) -> i32 {
        self.handler.invoke(args, assoc)
    }
}

impl fmt::Debug for LeafCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafCommand")
            .field("synopsis", &self.synopsis)
            .field("alias", &self.alias)
            .field("prompt_enabled", &self.prompt_enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Composite,
    Leaf(LeafCommand),
}

/// One command in the tree.
#[derive(Debug)]
pub struct CommandNode {
    name: String,
    doc: DocBlock,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    /// Aliases of this node's children.
    aliases: BTreeMap<String, NodeId>,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &DocBlock {
        &self.doc
    }

    pub fn shortdesc(&self) -> &str {
        self.doc.shortdesc()
    }

    pub fn longdesc(&self) -> &str {
        self.doc.longdesc()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn leaf(&self) -> Option<&LeafCommand> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Composite => None,
        }
    }

    pub fn has_subcommands(&self) -> bool {
        !self.children.is_empty()
    }

    /// Alias of this node, for leaves that declare one.
    pub fn alias(&self) -> Option<&str> {
        self.leaf().and_then(|leaf| leaf.alias.as_deref())
    }
}

/// Arena of command nodes.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    /// Create a tree holding only a root composite named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root_doc(root_name, DocBlock::default())
    }

    pub fn with_root_doc(root_name: impl Into<String>, doc: DocBlock) -> Self {
        Self {
            nodes: vec![CommandNode {
                name: root_name.into(),
                doc,
                kind: NodeKind::Composite,
                parent: None,
                children: BTreeMap::new(),
                aliases: BTreeMap::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Access a node. Ids are only minted by this tree.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Children of `id`, ordered by name.
    pub fn get_subcommands(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children.values().copied().collect()
    }

    /// Look up a child by exact name, then by alias.
    pub fn lookup_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.node(parent);
        node.children
            .get(name)
            .or_else(|| node.aliases.get(name))
            .copied()
    }

    /// Resolve the first token of `args` against the children of `parent`.
    ///
    /// The token is removed only when a child matched.
    pub fn find_subcommand(&self, parent: NodeId, args: &mut Vec<String>) -> Option<NodeId> {
        let child = self.lookup_child(parent, args.first()?)?;
        args.remove(0);
        Some(child)
    }

    /// Names and aliases of the children of `parent`.
    pub fn child_names(&self, parent: NodeId) -> impl Iterator<Item = &str> {
        let node = self.node(parent);
        node.children.keys().chain(node.aliases.keys()).map(String::as_str)
    }

    /// Names from the root's child down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        names.reverse();
        names
    }

    /// Space separated path, including the root name.
    pub fn full_path(&self, id: NodeId) -> String {
        let root = self.node(NodeId::ROOT).name.as_str();
        std::iter::once(root)
            .chain(self.path(id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Add an empty composite under `parent`.
    pub fn add_composite(
        &mut self,
        parent: NodeId,
        name: &str,
        doc: DocBlock,
    ) -> Result<NodeId, TreeError> {
        self.check_insert(parent, name, None)?;
        Ok(self.insert(parent, name, doc, NodeKind::Composite))
    }

    /// Add a leaf under `parent`.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        doc: DocBlock,
        leaf: LeafCommand,
    ) -> Result<NodeId, TreeError> {
        self.check_insert(parent, name, leaf.alias.as_deref())?;
        let alias = leaf.alias.clone();
        let id = self.insert(parent, name, doc, NodeKind::Leaf(leaf));
        if let Some(alias) = alias {
            self.nodes[parent.0].aliases.insert(alias, id);
        }
        Ok(id)
    }

    /// Return the composite child `name` of `parent`, creating it when missing.
    pub fn ensure_composite(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        match self.node(parent).children.get(name).copied() {
            Some(existing) if self.node(existing).is_leaf() => Err(TreeError::ParentIsLeaf {
                parent: self.full_path(existing),
                name: name.to_string(),
            }),
            Some(existing) => Ok(existing),
            None => self.add_composite(parent, name, DocBlock::default()),
        }
    }

    /// Walk `path` without creating anything.
    ///
    /// Returns the composite at the end of the path, or `None` when some
    /// component is missing and could be created. Fails when a leaf is in the
    /// way or the first missing name collides with an alias.
    pub(crate) fn find_path(&self, path: &[&str]) -> Result<Option<NodeId>, TreeError> {
        let mut current = self.root();
        for name in path {
            match self.node(current).children.get(*name).copied() {
                Some(child) if self.node(child).is_leaf() => {
                    return Err(TreeError::ParentIsLeaf {
                        parent: self.full_path(child),
                        name: name.to_string(),
                    });
                }
                Some(child) => current = child,
                None => {
                    self.check_insert(current, name, None)?;
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    /// Update the metadata of the root command in place.
    pub fn set_root_doc(&mut self, doc: DocBlock) {
        self.nodes[NodeId::ROOT.0].doc = doc;
    }

    /// Replace the metadata of a node that has none yet.
    pub(crate) fn fill_doc(&mut self, id: NodeId, doc: DocBlock) {
        let node = &mut self.nodes[id.0];
        if node.doc.is_empty() {
            node.doc = doc;
        }
    }

    /// Check that `name` (and its alias) can be added under `parent`.
    pub(crate) fn check_insert(
        &self,
        parent: NodeId,
        name: &str,
        alias: Option<&str>,
    ) -> Result<(), TreeError> {
        let node = self.node(parent);
        if node.is_leaf() {
            return Err(TreeError::ParentIsLeaf {
                parent: self.full_path(parent),
                name: name.to_string(),
            });
        }
        if node.children.contains_key(name) {
            return Err(TreeError::DuplicateName {
                parent: self.full_path(parent),
                name: name.to_string(),
            });
        }
        // A new real name must not sit behind an existing alias either.
        if node.aliases.contains_key(name) {
            return Err(TreeError::AliasCollision {
                parent: self.full_path(parent),
                name: name.to_string(),
                alias: name.to_string(),
            });
        }
        if let Some(alias) = alias
            && (alias == name
                || node.children.contains_key(alias)
                || node.aliases.contains_key(alias))
        {
            return Err(TreeError::AliasCollision {
                parent: self.full_path(parent),
                name: name.to_string(),
                alias: alias.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, parent: NodeId, name: &str, doc: DocBlock, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: name.to_string(),
            doc,
            kind,
            parent: Some(parent),
            children: BTreeMap::new(),
            aliases: BTreeMap::new(),
        });
        self.nodes[parent.0].children.insert(name.to_string(), id);
        debug!("Registered command {}", self.full_path(id));
        id
    }
}
