//! Hook executor for running hooks.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{Hook, HookContext, HookError, HookResult, Result};

/// Executor for running hooks.
///
/// One executor is owned by the command context; it is not shared between
/// threads, so registration and emission take `&mut self`.
#[derive(Debug, Default)]
pub struct HookExecutor {
    /// Registered hooks, in registration order.
    hooks: Vec<Hook>,
    /// Set of hook IDs that have been executed with `once` flag.
    executed_once: HashSet<String>,
}

impl HookExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    pub fn register(&mut self, hook: Hook) -> Result<()> {
        if self.hooks.iter().any(|h| h.id == hook.id) {
            return Err(HookError::AlreadyRegistered(hook.id));
        }
        debug!("Registered hook {} for {}", hook.id, hook.event);
        self.hooks.push(hook);
        Ok(())
    }

    /// Unregister a hook by ID.
    pub fn unregister(&mut self, hook_id: &str) -> Result<()> {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.id != hook_id);
        if self.hooks.len() == before {
            return Err(HookError::NotFound(hook_id.to_string()));
        }
        self.executed_once.remove(hook_id);
        Ok(())
    }

    /// Reset the "executed once" tracking.
    pub fn reset_once_tracking(&mut self) {
        self.executed_once.clear();
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Check whether any enabled hook subscribes to the event.
    pub fn has_subscribers(&self, event: &str) -> bool {
        self.hooks
            .iter()
            .any(|h| h.enabled && h.matches_event(event))
    }

    /// Run every enabled hook subscribed to `context.event`, in registration order.
    pub fn emit(&mut self, context: &HookContext) -> Vec<HookResult> {
        let mut results = Vec::new();

        for hook in self.hooks.iter().filter(|h| h.enabled) {
            if !hook.matches_event(&context.event) {
                continue;
            }

            if hook.once && self.executed_once.contains(&hook.id) {
                debug!("Skipping hook {} (already executed once)", hook.id);
                results.push(HookResult::skipped(&hook.id, "Already executed (once)"));
                continue;
            }

            let result = match hook.call(context) {
                Ok(()) => {
                    debug!("Hook {} handled {}", hook.id, context.event);
                    HookResult::success(&hook.id)
                }
                Err(message) => {
                    warn!("Hook {} failed on {}: {}", hook.id, context.event, message);
                    HookResult::failure(&hook.id, message)
                }
            };

            if hook.once {
                self.executed_once.insert(hook.id.clone());
            }

            let should_continue = result.success || hook.continue_on_error;
            results.push(result);

            if !should_continue {
                break;
            }
        }

        results
    }
}
