//! Global command-line options.
//!
//! clap parses the options written before the first command token. Global
//! options written after it reach the command's associative arguments and
//! are pulled back out by [`Cli::absorb_globals`].

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use cmdtree_commands::{AssocArgs, AssocValue, PromptStrategy};

/// Log level for tracing output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// cmdtree - hierarchical command dispatcher
#[derive(Debug, Parser)]
#[command(name = "cmdtree")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "cmdtree [OPTIONS] <COMMAND>... [--<key>[=<value>]]...")]
pub struct Cli {
    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        short = 'L',
        value_enum,
        default_value = "warn",
        env = "CMDTREE_LOG_LEVEL",
        help_heading = "Debugging"
    )]
    pub log_level: LogLevel,

    /// Prompt for arguments before running the command.
    ///
    /// Without a value every synopsis entry is asked for. With a
    /// comma-separated list only those associative keys are asked for.
    #[arg(
        long = "prompt",
        value_name = "FIELDS",
        num_args = 0..=1,
        require_equals = true,
        env = "CMDTREE_PROMPT"
    )]
    pub prompt: Option<Option<String>>,

    /// Print the registered command tree as JSON and exit.
    #[arg(long = "dump-tree")]
    pub dump_tree: bool,

    /// Command path followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Prompting strategy requested by `--prompt`, if any.
    pub fn prompt_strategy(&self) -> Option<PromptStrategy> {
        self.prompt.as_ref().map(|fields| match fields {
            Some(fields) => PromptStrategy::from_fields(fields),
            None => PromptStrategy::Wholesale,
        })
    }

    /// Apply global options that were written after the command tokens.
    ///
    /// They are removed from `assoc` so commands never see them.
    pub fn absorb_globals(&mut self, assoc: &mut AssocArgs) -> Result<()> {
        if let Some(value) = assoc.remove("log-level") {
            let level = value.as_str().context("--log-level needs a value")?;
            self.log_level = <LogLevel as ValueEnum>::from_str(level, true)
                .map_err(|e| anyhow!("invalid --log-level '{level}': {e}"))?;
        }
        if let Some(value) = assoc.remove("prompt") {
            self.prompt = match value {
                AssocValue::Flag(false) => None,
                AssocValue::Flag(true) => Some(None),
                AssocValue::Value(fields) => Some(Some(fields)),
            };
        }
        if let Some(value) = assoc.remove("dump-tree") {
            self.dump_tree = !matches!(value, AssocValue::Flag(false));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_tokens_keep_hyphens() {
        let cli = Cli::try_parse_from(["cmdtree", "music", "rock-on", "--volume=11"]).unwrap();

        assert_eq!(cli.command, vec!["music", "rock-on", "--volume=11"]);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert!(cli.prompt_strategy().is_none());
    }

    #[test]
    fn test_prompt_option() {
        let cli = Cli::try_parse_from(["cmdtree", "--prompt", "music", "rock-on"]).unwrap();
        assert_eq!(cli.prompt_strategy(), Some(PromptStrategy::Wholesale));
        assert_eq!(cli.command, vec!["music", "rock-on"]);

        let cli = Cli::try_parse_from(["cmdtree", "--prompt=volume", "music", "rock-on"]).unwrap();
        assert_eq!(
            cli.prompt_strategy(),
            Some(PromptStrategy::Fields(vec!["volume".to_string()]))
        );
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::try_parse_from(["cmdtree", "-L", "debug", "--dump-tree"]).unwrap();

        assert_eq!(cli.log_level.as_filter_str(), "debug");
        assert!(cli.dump_tree);
        assert!(cli.command.is_empty());
    }

    #[test]
    fn test_trailing_globals_are_applied() {
        let mut cli = Cli::try_parse_from(["cmdtree", "music", "play", "--prompt", "--volume=3"]).unwrap();
        let split = cmdtree_commands::split_tokens(cli.command.clone());
        let mut assoc = split.assoc;

        cli.absorb_globals(&mut assoc).unwrap();

        assert_eq!(cli.prompt_strategy(), Some(PromptStrategy::Wholesale));
        assert!(!assoc.contains_key("prompt"));
        assert_eq!(assoc.get("volume"), Some(&AssocValue::from("3")));
    }

    #[test]
    fn test_trailing_log_level() {
        let mut cli = Cli::try_parse_from(["cmdtree", "music"]).unwrap();
        let mut assoc = AssocArgs::new();
        assoc.insert("log-level".to_string(), "Debug".into());
        assoc.insert("dump-tree".to_string(), AssocValue::Flag(true));

        cli.absorb_globals(&mut assoc).unwrap();

        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.dump_tree);
        assert!(assoc.is_empty());

        assoc.insert("log-level".to_string(), AssocValue::Flag(true));
        assert!(cli.absorb_globals(&mut assoc).is_err());
    }
}
