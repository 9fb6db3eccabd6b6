//! Invocation arguments.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of one associative argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssocValue {
    /// Bare `--key` (true) or `--no-key` (false).
    Flag(bool),
    /// `--key=value`.
    Value(String),
}

impl AssocValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Flag(_) => None,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Flag(_))
    }
}

impl From<bool> for AssocValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for AssocValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for AssocValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for AssocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Value(v) => f.write_str(v),
        }
    }
}

/// Associative arguments keyed by name, without the leading dashes.
pub type AssocArgs = BTreeMap<String, AssocValue>;

/// Raw tokens split into positional and associative arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitArgs {
    pub positional: Vec<String>,
    pub assoc: AssocArgs,
}

/// Split raw command line tokens.
///
/// `--key=value` becomes a value, `--key` becomes `true`, `--no-key`
/// becomes `false`, and everything after a bare `--` is positional.
pub fn split_tokens<I, S>(tokens: I) -> SplitArgs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut split = SplitArgs::default();
    let mut options_done = false;

    for token in tokens {
        let token = token.into();
        if options_done {
            split.positional.push(token);
            continue;
        }
        if token == "--" {
            options_done = true;
            continue;
        }

        if !is_option(&token) {
            split.positional.push(token);
            continue;
        }

        let body = &token[2..];
        if let Some((key, value)) = body.split_once('=') {
            split.assoc.insert(key.to_string(), AssocValue::from(value));
        } else if let Some(key) = body.strip_prefix("no-").filter(|k| !k.is_empty()) {
            split.assoc.insert(key.to_string(), AssocValue::Flag(false));
        } else {
            split.assoc.insert(body.to_string(), AssocValue::Flag(true));
        }
    }

    split
}

fn is_option(token: &str) -> bool {
    token
        .strip_prefix("--")
        .is_some_and(|body| !body.is_empty() && !body.starts_with('='))
}
