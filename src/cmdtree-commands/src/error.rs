//! Error types for tree construction, dispatch and invocation.

use thiserror::Error;

/// Errors raised while building the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A sibling with the same name already exists.
    #[error("command '{name}' is already registered under '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// An alias collides with a sibling's name or alias.
    #[error("alias '{alias}' of '{name}' collides with an existing command under '{parent}'")]
    AliasCollision {
        parent: String,
        name: String,
        alias: String,
    },

    /// Children can only be added to composite commands.
    #[error("cannot register '{name}' under '{parent}': it is not a composite command")]
    ParentIsLeaf { parent: String, name: String },

    /// Two entries of one module map to the same command name.
    #[error("module registered at '{path}' defines '{name}' more than once")]
    DuplicateInModule { path: String, name: String },

    /// A single command needs at least one path component for its name.
    #[error("a single command cannot be registered at the root")]
    EmptyPath,
}

/// Errors raised while resolving tokens to a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("'{token}' is not a registered {path} command{}", did_you_mean(.suggestion))]
    UnknownCommand {
        token: String,
        path: String,
        suggestion: Option<String>,
    },

    #[error("'{token}' is not a registered subcommand of '{path}'{}", did_you_mean(.suggestion))]
    UnknownSubcommand {
        token: String,
        path: String,
        suggestion: Option<String>,
    },

    /// A lazily loaded module failed to register.
    #[error("Registration error: {0}")]
    Registration(#[from] TreeError),
}

impl DispatchError {
    /// The token that could not be resolved, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::UnknownCommand { token, .. } | Self::UnknownSubcommand { token, .. } => {
                Some(token)
            }
            Self::Registration(_) => None,
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(". Did you mean '{s}'?"))
        .unwrap_or_default()
}

/// Errors that stop an invocation after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The prompter ran out of input.
    #[error("prompt aborted while asking for {token} of '{command}'")]
    PromptAborted { command: String, token: String },

    /// Only leaf commands can be invoked.
    #[error("'{command}' is not an invokable command")]
    NotALeaf { command: String },

    /// Validation produced fatal issues. `lines` are already decorated.
    #[error("Parameter errors:\n{}", .lines.join("\n"))]
    InvalidArguments {
        command: String,
        lines: Vec<String>,
        usage: Vec<String>,
    },
}

/// Any failure surfaced by [`CommandManager`](crate::CommandManager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),
}
