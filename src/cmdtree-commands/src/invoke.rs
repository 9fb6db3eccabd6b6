//! Invocation of a resolved leaf: prompt, validate, hook, execute.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use cmdtree_hooks::{HookContext, HookExecutor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::args::{AssocArgs, AssocValue};
use crate::config::DispatchConfig;
use crate::docblock::DocBlock;
use crate::error::InvokeError;
use crate::output::Output;
use crate::synopsis::{ArgKind, ArgSpec};
use crate::tree::{CommandTree, NodeId};
use crate::validator::{ArgIssue, SynopsisValidator};

/// Source of interactive answers.
pub trait Prompter {
    /// Ask `question`. `None` means no more input is available.
    fn prompt(&mut self, question: &str) -> Option<String>;
}

/// Prompter for non-interactive runs; never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompter;

impl Prompter for NoPrompter {
    fn prompt(&mut self, _question: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<String>,
    questions: Vec<String>,
}

/// Answers questions from a fixed list and records what was asked.
///
/// Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    script: Rc<RefCell<Script>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Rc::new(RefCell::new(Script {
                answers: answers.into_iter().map(Into::into).collect(),
                questions: Vec::new(),
            })),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.script.borrow().questions.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, question: &str) -> Option<String> {
        let mut script = self.script.borrow_mut();
        script.questions.push(question.to_string());
        script.answers.pop_front()
    }
}

/// Which synopsis entries get prompted when prompting is on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStrategy {
    /// Prompt every entry and replace the supplied arguments.
    #[default]
    Wholesale,
    /// Prompt only entries that were not supplied.
    MissingOnly,
    /// Prompt only the listed associative keys.
    Fields(Vec<String>),
}

impl PromptStrategy {
    /// Parse the value of `--prompt`: empty means wholesale, otherwise a
    /// comma separated key list.
    pub fn from_fields(fields: &str) -> Self {
        let names: Vec<String> = fields
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_start_matches("--").to_string())
            .collect();
        if names.is_empty() {
            Self::Wholesale
        } else {
            Self::Fields(names)
        }
    }

    fn selects(&self, spec: &ArgSpec, supplied: bool) -> bool {
        match self {
            Self::Wholesale => true,
            Self::MissingOnly => !supplied,
            Self::Fields(names) => spec.is_keyed() && names.iter().any(|n| *n == spec.name),
        }
    }
}

/// Ask for arguments of one command, in synopsis order.
///
/// Positionals are rebuilt from the answers; prompted associative keys are
/// overwritten. Under [`PromptStrategy::Wholesale`] supplied positionals are
/// discarded.
pub fn prompt_args(
    command: &str,
    spec: &[ArgSpec],
    positional: &mut Vec<String>,
    assoc: &mut AssocArgs,
    strategy: &PromptStrategy,
    prompter: &mut dyn Prompter,
) -> Result<(), InvokeError> {
    let declared: HashSet<&str> = spec
        .iter()
        .filter(|s| matches!(s.kind, ArgKind::Assoc | ArgKind::Flag))
        .map(|s| s.name.as_str())
        .collect();

    let mut plan = Vec::new();
    let mut index = 0;
    for entry in spec.iter().filter(|s| s.kind != ArgKind::Unknown) {
        let existing: Vec<String> = match entry.kind {
            ArgKind::Positional if entry.repeating => {
                let rest = positional.get(index..).unwrap_or(&[]).to_vec();
                index = index.max(positional.len());
                rest
            }
            ArgKind::Positional => {
                let value = positional.get(index).cloned();
                index += 1;
                value.into_iter().collect()
            }
            _ => Vec::new(),
        };
        let supplied = match entry.kind {
            ArgKind::Positional => !existing.is_empty(),
            ArgKind::Assoc | ArgKind::Flag => assoc.contains_key(&entry.name),
            ArgKind::Generic => assoc.keys().any(|k| !declared.contains(k.as_str())),
            ArgKind::Unknown => true,
        };
        plan.push((entry, strategy.selects(entry, supplied), existing));
    }

    let total = plan.iter().filter(|(_, ask, _)| *ask).count();
    if total == 0 {
        return Ok(());
    }
    let surplus = positional.get(index..).unwrap_or(&[]).to_vec();

    let mut rebuilt = Vec::new();
    let mut asked = 0;
    for (entry, ask, existing) in plan {
        if !ask {
            rebuilt.extend(existing);
            continue;
        }
        asked += 1;
        let question = format!("{asked}/{total} {}", entry.token);
        let mut ask_for = |question: &str, required: bool| {
            ask_until_answered(&mut *prompter, question, required).ok_or_else(|| {
                InvokeError::PromptAborted {
                    command: command.to_string(),
                    token: entry.token.clone(),
                }
            })
        };

        match entry.kind {
            ArgKind::Positional => {
                let answer = ask_for(&question, entry.is_required())?;
                if entry.repeating {
                    rebuilt.extend(answer.split_whitespace().map(str::to_string));
                } else if !answer.is_empty() {
                    rebuilt.push(answer);
                }
            }
            ArgKind::Assoc => {
                let answer = ask_for(&question, entry.is_required())?;
                assoc.remove(&entry.name);
                if !answer.is_empty() {
                    assoc.insert(entry.name.clone(), AssocValue::Value(answer));
                }
            }
            ArgKind::Flag => {
                let answer = ask_for(&format!("{question} (Y/n)"), false)?;
                assoc.remove(&entry.name);
                if answer.eq_ignore_ascii_case("y") {
                    assoc.insert(entry.name.clone(), AssocValue::Flag(true));
                } else if entry.negatable {
                    assoc.insert(entry.name.clone(), AssocValue::Flag(false));
                }
            }
            ArgKind::Generic => loop {
                let key = ask_for(&format!("{asked}/{total} --<{}>=", entry.name), false)?;
                if key.is_empty() {
                    break;
                }
                let value_name = entry.value.as_ref().map_or("value", |v| v.name.as_str());
                let value = ask_for(&format!("{asked}/{total} --{key}=<{value_name}>"), false)?;
                assoc.insert(key, AssocValue::Value(value));
            },
            ArgKind::Unknown => {}
        }
    }

    if *strategy != PromptStrategy::Wholesale {
        rebuilt.extend(surplus);
    }
    *positional = rebuilt;
    Ok(())
}

fn ask_until_answered(prompter: &mut dyn Prompter, question: &str, required: bool) -> Option<String> {
    loop {
        let answer = prompter.prompt(question)?.trim().to_string();
        if !answer.is_empty() || !required {
            return Some(answer);
        }
    }
}

/// Steps of one invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prompt,
    Validate,
    Hook,
    Execute,
}

/// Runs one resolved leaf through every invocation stage.
pub struct InvocationEngine<'a> {
    pub tree: &'a CommandTree,
    pub hooks: &'a mut HookExecutor,
    pub prompter: &'a mut dyn Prompter,
    pub output: &'a mut dyn Output,
    pub config: &'a DispatchConfig,
    /// Nodes whose synopsis problems were already reported.
    pub reported: &'a mut HashSet<NodeId>,
}

impl InvocationEngine<'_> {
    /// Invoke the leaf `node` and return the handler's status.
    pub fn invoke(
        &mut self,
        node: NodeId,
        mut args: Vec<String>,
        mut assoc: AssocArgs,
    ) -> Result<i32, InvokeError> {
        let tree = self.tree;
        let command = tree.full_path(node);
        let Some(leaf) = tree.node(node).leaf() else {
            return Err(InvokeError::NotALeaf { command });
        };

        self.stage(Stage::Prompt, &command);
        if (leaf.prompt_enabled || self.config.force_prompt) && !leaf.synopsis.is_empty() {
            prompt_args(
                &command,
                &leaf.synopsis,
                &mut args,
                &mut assoc,
                &self.config.prompt,
                &mut *self.prompter,
            )?;
        }

        self.stage(Stage::Validate, &command);
        if !leaf.synopsis.is_empty() {
            let validator = SynopsisValidator::new(&leaf.synopsis);
            if self.reported.insert(node) {
                for token in validator.unknown_tokens() {
                    let issue = ArgIssue::InvalidSynopsis {
                        token: token.to_string(),
                    };
                    self.output.warning(&format!("{command}: {issue}"));
                }
            }

            let result = validator.validate(&args, &assoc, &self.config.reference_keys);
            for issue in &result.warning {
                self.output.warning(&issue.to_string());
            }
            for key in &result.to_unset {
                assoc.remove(key);
            }
            if result.has_fatal() {
                let doc = tree.node(node).doc();
                let lines = result.fatal.iter().map(|i| decorate(i, doc)).collect();
                return Err(InvokeError::InvalidArguments {
                    command,
                    lines,
                    usage: tree.show_usage(node),
                });
            }
        }

        self.stage(Stage::Hook, &command);
        let path = tree.path(node).join(" ");
        if let Some(parent) = tree.node(node).parent()
            && parent != tree.root()
        {
            let parent_path = tree.path(parent).join(" ");
            self.emit(&format!("before_invoke:{parent_path}"), &path, &args, &assoc);
        }
        self.emit(&format!("before_invoke:{path}"), &path, &args, &assoc);

        self.stage(Stage::Execute, &command);
        let status = leaf.invoke(&args, &assoc);
        info!(command = %command, status, "Command finished");

        if status == 0 {
            self.emit(&format!("after_invoke:{path}"), &path, &args, &assoc);
        }
        Ok(status)
    }

    fn stage(&self, stage: Stage, command: &str) {
        debug!(command, stage = ?stage, "Invocation stage");
    }

    fn emit(&mut self, event: &str, path: &str, args: &[String], assoc: &AssocArgs) {
        let context = assoc.iter().fold(
            HookContext::new(event)
                .with_command(path)
                .with_args(args.iter().cloned()),
            |ctx, (key, value)| ctx.with_data(key.clone(), value.to_string()),
        );
        let results = self.hooks.emit(&context);
        debug!("Emitted {} to {} hook(s)", event, results.len());
    }
}

/// Render a fatal issue with its `## OPTIONS` description, when there is one.
fn decorate(issue: &ArgIssue, doc: &DocBlock) -> String {
    match issue.key().and_then(|key| doc.param_desc(key)) {
        Some(desc) => format!(" {issue} ({desc})"),
        None => format!(" {issue}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synopsis;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wholesale_replaces_supplied_args() {
        let spec = synopsis::parse("<file> [<rest>...] --format=<format> [--force]");
        let mut positional = strings(&["old.sql"]);
        let mut assoc = AssocArgs::new();
        assoc.insert("format".to_string(), "csv".into());
        let mut prompter = ScriptedPrompter::new(["new.sql", "a b", "json", "y"]);

        prompt_args(
            "cmdtree db export",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::Wholesale,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(positional, strings(&["new.sql", "a", "b"]));
        assert_eq!(assoc.get("format"), Some(&AssocValue::from("json")));
        assert_eq!(assoc.get("force"), Some(&AssocValue::Flag(true)));
        assert_eq!(
            prompter.questions(),
            strings(&[
                "1/4 <file>",
                "2/4 [<rest>...]",
                "3/4 --format=<format>",
                "4/4 [--force] (Y/n)",
            ])
        );
    }

    #[test]
    fn test_required_entry_insists() {
        let spec = synopsis::parse("<file>");
        let mut positional = Vec::new();
        let mut assoc = AssocArgs::new();
        let mut prompter = ScriptedPrompter::new(["", "  ", "out.sql"]);

        prompt_args(
            "cmd",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::Wholesale,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(positional, strings(&["out.sql"]));
        assert_eq!(prompter.questions().len(), 3);
    }

    #[test]
    fn test_optional_entry_accepts_empty() {
        let spec = synopsis::parse("[--volume=<number>]");
        let mut positional = Vec::new();
        let mut assoc = AssocArgs::new();
        assoc.insert("volume".to_string(), "3".into());
        let mut prompter = ScriptedPrompter::new([""]);

        prompt_args(
            "cmd",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::Wholesale,
            &mut prompter,
        )
        .unwrap();

        assert!(assoc.is_empty());
    }

    #[test]
    fn test_missing_only_keeps_supplied() {
        let spec = synopsis::parse("<a> <b> --k=<v> --m=<v>");
        let mut positional = strings(&["one"]);
        let mut assoc = AssocArgs::new();
        assoc.insert("k".to_string(), "kept".into());
        let mut prompter = ScriptedPrompter::new(["two", "asked"]);

        prompt_args(
            "cmd",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::MissingOnly,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(positional, strings(&["one", "two"]));
        assert_eq!(assoc.get("k"), Some(&AssocValue::from("kept")));
        assert_eq!(assoc.get("m"), Some(&AssocValue::from("asked")));
        assert_eq!(prompter.questions(), strings(&["1/2 <b>", "2/2 --m=<v>"]));
    }

    #[test]
    fn test_fields_strategy() {
        let spec = synopsis::parse("<a> --k=<v> --m=<v>");
        let mut positional = strings(&["one", "extra"]);
        let mut assoc = AssocArgs::new();
        let mut prompter = ScriptedPrompter::new(["mm"]);

        prompt_args(
            "cmd",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::from_fields("--m"),
            &mut prompter,
        )
        .unwrap();

        assert_eq!(positional, strings(&["one", "extra"]));
        assert_eq!(assoc.get("m"), Some(&AssocValue::from("mm")));
        assert!(!assoc.contains_key("k"));
        assert_eq!(prompter.questions(), strings(&["1/1 --m=<v>"]));
    }

    #[test]
    fn test_generic_asks_key_then_value() {
        let spec = synopsis::parse("[--<field>=<value>]");
        let mut positional = Vec::new();
        let mut assoc = AssocArgs::new();
        let mut prompter = ScriptedPrompter::new(["color", "red", ""]);

        prompt_args(
            "cmd",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::Wholesale,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(assoc.get("color"), Some(&AssocValue::from("red")));
        assert_eq!(
            prompter.questions(),
            strings(&["1/1 --<field>=", "1/1 --color=<value>", "1/1 --<field>="])
        );
    }

    #[test]
    fn test_end_of_input_aborts() {
        let spec = synopsis::parse("<file>");
        let mut positional = Vec::new();
        let mut assoc = AssocArgs::new();

        let err = prompt_args(
            "cmdtree db export",
            &spec,
            &mut positional,
            &mut assoc,
            &PromptStrategy::Wholesale,
            &mut NoPrompter,
        )
        .unwrap_err();

        assert_eq!(
            err,
            InvokeError::PromptAborted {
                command: "cmdtree db export".to_string(),
                token: "<file>".to_string()
            }
        );
    }

    #[test]
    fn test_prompt_strategy_from_fields() {
        assert_eq!(PromptStrategy::from_fields(""), PromptStrategy::Wholesale);
        assert_eq!(
            PromptStrategy::from_fields("volume, --format"),
            PromptStrategy::Fields(strings(&["volume", "format"]))
        );
    }
}
