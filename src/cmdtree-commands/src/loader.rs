//! Lazy population of the command tree.

use std::collections::HashMap;

use tracing::debug;

use crate::error::TreeError;
use crate::module::Implementation;
use crate::tree::{CommandTree, NodeId};

/// Gives an external collaborator one chance to register a missing command.
pub trait LazyLoader {
    /// Try to register `name` under `parent`.
    ///
    /// Returns `Ok(true)` when something was registered.
    fn load(&mut self, tree: &mut CommandTree, parent: NodeId, name: &str)
    -> Result<bool, TreeError>;
}

type ModuleFactory = Box<dyn FnOnce() -> Implementation>;

/// Modules registered on first use of their path.
///
/// Each factory runs at most once; it is consumed whether or not the
/// registration succeeds.
#[derive(Default)]
pub struct DeferredModules {
    pending: HashMap<Vec<String>, ModuleFactory>,
}

impl DeferredModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer registration of the implementation returned by `factory` at `path`.
    pub fn defer<F>(&mut self, path: &[&str], factory: F)
    where
        F: FnOnce() -> Implementation + 'static,
    {
        let key = path.iter().map(|s| s.to_string()).collect();
        self.pending.insert(key, Box::new(factory));
    }

    pub fn is_pending(&self, path: &[&str]) -> bool {
        self.pending
            .keys()
            .any(|key| key.iter().map(String::as_str).eq(path.iter().copied()))
    }

    /// Paths still waiting for their first use, sorted.
    pub fn pending_paths(&self) -> Vec<Vec<String>> {
        let mut paths: Vec<Vec<String>> = self.pending.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl std::fmt::Debug for DeferredModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredModules")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LazyLoader for DeferredModules {
    fn load(
        &mut self,
        tree: &mut CommandTree,
        parent: NodeId,
        name: &str,
    ) -> Result<bool, TreeError> {
        let mut key: Vec<String> = tree.path(parent).into_iter().map(str::to_string).collect();
        key.push(name.to_string());

        let Some(factory) = self.pending.remove(&key) else {
            return Ok(false);
        };

        debug!("Loading deferred module {}", key.join(" "));
        let path: Vec<&str> = key.iter().map(String::as_str).collect();
        tree.register(&path, factory())?;
        Ok(true)
    }
}
