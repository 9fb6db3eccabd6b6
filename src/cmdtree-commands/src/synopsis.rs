//! Synopsis grammar.
//!
//! A synopsis is a single line of space separated tokens:
//!
//! | Token | Meaning |
//! |---|---|
//! | `<name>` / `[<name>]` | positional |
//! | `<name>...` | repeating positional |
//! | `--key=<val>` / `[--key=<val>]` | associative argument |
//! | `--key[=<val>]` | associative argument with an optional value |
//! | `--<field>=<value>` | generic associative argument (any key) |
//! | `--key` / `[--key]` | flag |
//! | `--[no-]key` | negatable flag |
//!
//! Tokens that fit none of these forms are kept as [`ArgKind::Unknown`].

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| panic!("synopsis regex failed to compile: {pattern}"))
}

static POSITIONAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^<([A-Za-z0-9][A-Za-z0-9_-]*)>$"));
static GENERIC: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^--<([A-Za-z0-9][A-Za-z0-9_-]*)>=<([A-Za-z0-9][A-Za-z0-9_-]*)>$")
});
static ASSOC: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^--([A-Za-z0-9][A-Za-z0-9_-]*)(\[)?=<([A-Za-z0-9][A-Za-z0-9_-]*)>(\])?$")
});
static FLAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^--(\[no-\])?([A-Za-z0-9][A-Za-z0-9_-]*)$"));

/// Kind of a synopsis entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Positional,
    Generic,
    Assoc,
    Flag,
    /// Token that matched no grammar form.
    Unknown,
}

/// Value placeholder of an associative entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueSpec {
    pub name: String,
    /// `--key[=<val>]`: the key may be given without a value.
    pub optional: bool,
}

/// One parsed synopsis entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub name: String,
    /// Original text of the token.
    pub token: String,
    pub optional: bool,
    pub repeating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueSpec>,
    /// `--[no-]key` form.
    pub negatable: bool,
}

impl ArgSpec {
    fn unknown(token: &str) -> Self {
        Self {
            kind: ArgKind::Unknown,
            name: String::new(),
            token: token.to_string(),
            optional: false,
            repeating: false,
            value: None,
            negatable: false,
        }
    }

    /// Parse a single synopsis token.
    pub fn parse(token: &str) -> Self {
        let mut inner = token;
        let mut optional = false;
        if inner.len() >= 2 && inner.starts_with('[') && inner.ends_with(']') {
            optional = true;
            inner = &inner[1..inner.len() - 1];
        }

        let mut repeating = false;
        if let Some(stripped) = inner.strip_suffix("...") {
            repeating = true;
            inner = stripped;
        }

        let mut spec = Self::unknown(token);
        spec.optional = optional;
        spec.repeating = repeating;

        if let Some(caps) = POSITIONAL.captures(inner) {
            spec.kind = ArgKind::Positional;
            spec.name = caps[1].to_string();
            return spec;
        }

        // Only positionals repeat.
        if repeating {
            return Self::unknown(token);
        }

        if let Some(caps) = GENERIC.captures(inner) {
            spec.kind = ArgKind::Generic;
            spec.name = caps[1].to_string();
            spec.value = Some(ValueSpec {
                name: caps[2].to_string(),
                optional: false,
            });
        } else if let Some(caps) = ASSOC.captures(inner) {
            let open = caps.get(2).is_some();
            let close = caps.get(4).is_some();
            if open != close {
                return Self::unknown(token);
            }
            spec.kind = ArgKind::Assoc;
            spec.name = caps[1].to_string();
            spec.value = Some(ValueSpec {
                name: caps[3].to_string(),
                optional: open,
            });
        } else if let Some(caps) = FLAG.captures(inner) {
            spec.kind = ArgKind::Flag;
            spec.negatable = caps.get(1).is_some();
            spec.name = caps[2].to_string();
        } else {
            return Self::unknown(token);
        }

        spec
    }

    pub fn is_positional(&self) -> bool {
        self.kind == ArgKind::Positional
    }

    /// Whether the entry is supplied as `--key`.
    pub fn is_keyed(&self) -> bool {
        matches!(self.kind, ArgKind::Assoc | ArgKind::Flag | ArgKind::Generic)
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }

    /// Canonical synopsis text for this entry.
    pub fn render(&self) -> String {
        let core = match self.kind {
            ArgKind::Unknown => return self.token.clone(),
            ArgKind::Positional if self.repeating => format!("<{}>...", self.name),
            ArgKind::Positional => format!("<{}>", self.name),
            ArgKind::Generic => {
                let value = self.value.as_ref().map_or("value", |v| v.name.as_str());
                format!("--<{}>=<{}>", self.name, value)
            }
            ArgKind::Assoc => match &self.value {
                Some(ValueSpec {
                    name,
                    optional: true,
                }) => format!("--{}[=<{}>]", self.name, name),
                Some(ValueSpec { name, .. }) => format!("--{}=<{}>", self.name, name),
                None => format!("--{}=<value>", self.name),
            },
            ArgKind::Flag if self.negatable => format!("--[no-]{}", self.name),
            ArgKind::Flag => format!("--{}", self.name),
        };

        if self.optional {
            format!("[{core}]")
        } else {
            core
        }
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Parse a synopsis line into its entries, in declaration order.
pub fn parse(synopsis: &str) -> Vec<ArgSpec> {
    synopsis.split_whitespace().map(ArgSpec::parse).collect()
}

/// Serialize parsed entries back into synopsis text.
pub fn render(specs: &[ArgSpec]) -> String {
    specs
        .iter()
        .map(ArgSpec::render)
        .collect::<Vec<_>>()
        .join(" ")
}
