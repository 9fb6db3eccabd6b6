//! Dispatch configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::invoke::PromptStrategy;

/// Settings shared by resolution and invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Name of the root command, used in usage lines.
    pub root_name: String,

    /// Associative keys every command accepts.
    pub reference_keys: BTreeSet<String>,

    /// Which entries get prompted.
    pub prompt: PromptStrategy,

    /// Prompt for every command, not only those that enable it.
    pub force_prompt: bool,

    /// Maximum edit distance for "did you mean" suggestions.
    pub suggestion_distance: usize,

    /// Resolve `help <path...>` to the help page of the named command.
    pub builtin_help: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            root_name: "cmdtree".to_string(),
            reference_keys: BTreeSet::new(),
            prompt: PromptStrategy::default(),
            force_prompt: false,
            suggestion_distance: 2,
            builtin_help: true,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Accept `key` on every command.
    pub fn with_reference_key(mut self, key: impl Into<String>) -> Self {
        self.reference_keys.insert(key.into());
        self
    }

    pub fn with_reference_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_prompt(mut self, strategy: PromptStrategy) -> Self {
        self.prompt = strategy;
        self
    }

    pub fn with_force_prompt(mut self, force: bool) -> Self {
        self.force_prompt = force;
        self
    }

    pub fn with_suggestion_distance(mut self, distance: usize) -> Self {
        self.suggestion_distance = distance;
        self
    }

    pub fn with_builtin_help(mut self, enabled: bool) -> Self {
        self.builtin_help = enabled;
        self
    }
}
