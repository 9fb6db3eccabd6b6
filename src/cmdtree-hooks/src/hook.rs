//! Hook definitions and types.

use std::collections::BTreeMap;
use std::fmt;

use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Execution status of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    /// Hook completed successfully.
    Success,
    /// Hook reported a failure.
    Failure,
    /// Hook was skipped (already executed with `once` flag).
    Skipped,
}

/// Callback invoked when a subscribed event fires.
pub type HookCallback = Box<dyn Fn(&HookContext) -> Result<(), String>>;

/// A subscription to one or more named events.
pub struct Hook {
    /// Hook identifier.
    pub id: String,
    /// Event name or glob pattern this hook subscribes to.
    pub event: String,
    /// Whether hook is enabled.
    pub enabled: bool,
    /// Whether to keep running later hooks when this one fails.
    pub continue_on_error: bool,
    /// If true, execute only once per executor.
    pub once: bool,
    pattern: Option<Pattern>,
    callback: HookCallback,
}

impl Hook {
    pub fn new<F>(id: impl Into<String>, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), String> + 'static,
    {
        let event = event.into();
        // Plain event names never need the matcher.
        let pattern = if event.contains(['*', '?', '[']) {
            Pattern::new(&event).ok()
        } else {
            None
        };

        Self {
            id: id.into(),
            event,
            enabled: true,
            continue_on_error: false,
            once: false,
            pattern,
            callback: Box::new(callback),
        }
    }

    /// Configure the hook to execute only once.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Keep running the remaining hooks for an event even if this one fails.
    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check if this hook subscribes to the given event name.
    pub fn matches_event(&self, event: &str) -> bool {
        if self.event == event {
            return true;
        }
        self.pattern.as_ref().is_some_and(|p| p.matches(event))
    }

    pub(crate) fn call(&self, context: &HookContext) -> Result<(), String> {
        (self.callback)(context)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("enabled", &self.enabled)
            .field("continue_on_error", &self.continue_on_error)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// Context for hook execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HookContext {
    /// Name of the emitted event.
    pub event: String,
    /// Command path (space separated) that triggered the event.
    pub command: Option<String>,
    /// Positional arguments of the invocation.
    pub args: Vec<String>,
    /// Additional data.
    pub data: BTreeMap<String, String>,
}

impl HookContext {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Result of hook execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResult {
    /// Hook ID.
    pub hook_id: String,
    /// Whether hook succeeded.
    pub success: bool,
    /// Failure message or skip reason.
    pub message: Option<String>,
    /// Execution status.
    pub status: HookStatus,
}

impl HookResult {
    pub fn success(hook_id: impl Into<String>) -> Self {
        Self {
            hook_id: hook_id.into(),
            success: true,
            message: None,
            status: HookStatus::Success,
        }
    }

    pub fn failure(hook_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            hook_id: hook_id.into(),
            success: false,
            message: Some(error.into()),
            status: HookStatus::Failure,
        }
    }

    /// Create a result for a skipped hook.
    pub fn skipped(hook_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            hook_id: hook_id.into(),
            success: true,
            message: Some(reason.into()),
            status: HookStatus::Skipped,
        }
    }
}
