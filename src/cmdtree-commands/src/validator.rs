//! Validation of invocation arguments against a parsed synopsis.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::args::{AssocArgs, AssocValue};
use crate::synopsis::{ArgKind, ArgSpec};

/// One problem found while validating arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgIssue {
    #[error("too few positional arguments: expected at least {expected}, got {given}")]
    InsufficientPositionals { expected: usize, given: usize },

    #[error("too many positional arguments: {}", .extra.join(" "))]
    TooManyPositionals { extra: Vec<String> },

    #[error("missing --{key} parameter")]
    MissingAssoc { key: String },

    #[error("--{key} parameter needs a value")]
    MissingValue { key: String },

    #[error("--{key} parameter does not accept a value")]
    UnexpectedValue { key: String },

    #[error("unknown --{key} parameter")]
    UnknownAssocKey { key: String },

    #[error("invalid synopsis token: {token}")]
    InvalidSynopsis { token: String },
}

impl ArgIssue {
    /// Associative key the issue refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingAssoc { key }
            | Self::MissingValue { key }
            | Self::UnexpectedValue { key }
            | Self::UnknownAssocKey { key } => Some(key),
            _ => None,
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Issues that stop the invocation.
    pub fatal: Vec<ArgIssue>,
    /// Issues that are reported but do not block.
    pub warning: Vec<ArgIssue>,
    pub unknown_assoc_keys: BTreeSet<String>,
    /// Keys to drop from the associative arguments before the handler runs.
    pub to_unset: Vec<String>,
}

impl ValidationResult {
    pub fn has_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.fatal.is_empty() && self.warning.is_empty()
    }

    fn merge(&mut self, other: ValidationResult) {
        self.fatal.extend(other.fatal);
        self.warning.extend(other.warning);
        self.unknown_assoc_keys.extend(other.unknown_assoc_keys);
        self.to_unset.extend(other.to_unset);
    }
}

/// Checks actual arguments against one command's synopsis.
#[derive(Debug, Clone, Copy)]
pub struct SynopsisValidator<'a> {
    spec: &'a [ArgSpec],
}

impl<'a> SynopsisValidator<'a> {
    pub fn new(spec: &'a [ArgSpec]) -> Self {
        Self { spec }
    }

    fn positionals(&self) -> impl Iterator<Item = &'a ArgSpec> {
        self.spec.iter().filter(|s| s.is_positional())
    }

    /// Synopsis tokens that matched no grammar form.
    pub fn unknown_tokens(&self) -> Vec<&'a str> {
        self.spec
            .iter()
            .filter(|s| s.kind == ArgKind::Unknown)
            .map(|s| s.token.as_str())
            .collect()
    }

    pub fn required_positionals(&self) -> usize {
        self.positionals().filter(|s| s.is_required()).count()
    }

    /// Whether `count` positionals satisfy every required positional.
    pub fn enough_positionals(&self, count: usize) -> bool {
        count >= self.required_positionals()
    }

    /// Positionals beyond what the synopsis declares.
    ///
    /// Always empty when a repeating positional is declared.
    pub fn unknown_positionals<'b>(&self, args: &'b [String]) -> &'b [String] {
        if self.positionals().any(|s| s.repeating) {
            return &[];
        }
        let declared = self.positionals().count();
        args.get(declared..).unwrap_or(&[])
    }

    /// Check declared associative entries against the supplied map.
    pub fn validate_assoc(
        &self,
        assoc: &AssocArgs,
        reference: &BTreeSet<String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();

        for spec in self.spec {
            if !matches!(spec.kind, ArgKind::Assoc | ArgKind::Flag) {
                continue;
            }

            let Some(value) = assoc.get(&spec.name) else {
                if spec.is_required() && !reference.contains(&spec.name) {
                    result.fatal.push(ArgIssue::MissingAssoc {
                        key: spec.name.clone(),
                    });
                }
                continue;
            };

            match (spec.kind, value) {
                (ArgKind::Assoc, AssocValue::Flag(_))
                    if !spec.value.as_ref().is_some_and(|v| v.optional) =>
                {
                    // A shape mismatch only warns, even for a required key. The
                    // bare flag is dropped so the handler sees the key as absent.
                    result.warning.push(ArgIssue::MissingValue {
                        key: spec.name.clone(),
                    });
                    result.to_unset.push(spec.name.clone());
                }
                (ArgKind::Flag, AssocValue::Value(_)) => {
                    result.warning.push(ArgIssue::UnexpectedValue {
                        key: spec.name.clone(),
                    });
                }
                _ => {}
            }
        }

        result
    }

    /// Supplied keys that neither the synopsis nor `reference` declares.
    ///
    /// A generic `--<field>=<value>` entry accepts every key.
    pub fn unknown_assoc(&self, assoc: &AssocArgs, reference: &BTreeSet<String>) -> BTreeSet<String> {
        if self.spec.iter().any(|s| s.kind == ArgKind::Generic) {
            return BTreeSet::new();
        }

        assoc
            .keys()
            .filter(|key| !reference.contains(*key))
            .filter(|key| {
                !self
                    .spec
                    .iter()
                    .any(|s| s.is_keyed() && &s.name == *key)
            })
            .cloned()
            .collect()
    }

    /// Run every check for one invocation.
    pub fn validate(
        &self,
        positional: &[String],
        assoc: &AssocArgs,
        reference: &BTreeSet<String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.enough_positionals(positional.len()) {
            result.fatal.push(ArgIssue::InsufficientPositionals {
                expected: self.required_positionals(),
                given: positional.len(),
            });
        }

        let extra = self.unknown_positionals(positional);
        if !extra.is_empty() {
            result.fatal.push(ArgIssue::TooManyPositionals {
                extra: extra.to_vec(),
            });
        }

        result.merge(self.validate_assoc(assoc, reference));

        let unknown = self.unknown_assoc(assoc, reference);
        result.warning.extend(
            unknown
                .iter()
                .map(|key| ArgIssue::UnknownAssocKey { key: key.clone() }),
        );
        result.unknown_assoc_keys = unknown;

        result
    }
}
