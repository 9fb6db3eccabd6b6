//! cmdtree binary.
//!
//! Parses global options, installs logging, registers the bundled command
//! modules and hands the remaining tokens to the command manager.

mod args;
mod demo;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cmdtree_commands::{CommandManager, DeferredModules, DispatchConfig, Prompter, split_tokens};
use cmdtree_hooks::{Hook, HookContext};
use tracing::debug;

use crate::args::Cli;

const ROOT_DOC: &str = "\
Manage things from the command line.

Run 'cmdtree help <command>' for details on any command.";

/// Prompter reading answers from standard input.
struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, question: &str) -> Option<String> {
        print!("{question}: ");
        io::stdout().flush().ok()?;

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "warn,cmdtree={level},cmdtree_commands={level},cmdtree_hooks={level}",
            level = cli.log_level.as_filter_str()
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_manager(cli: &Cli, deferred: DeferredModules) -> Result<CommandManager> {
    let mut config = DispatchConfig::new().with_root_name("cmdtree");
    if let Some(strategy) = cli.prompt_strategy() {
        config = config.with_prompt(strategy).with_force_prompt(true);
    }

    let mut manager = CommandManager::new(config)
        .with_root_doc(ROOT_DOC)
        .with_prompter(StdinPrompter)
        .with_loader(deferred);

    for (path, implementation) in demo::eager_modules() {
        manager
            .register(path, implementation)
            .with_context(|| format!("Failed to register '{}'", path.join(" ")))?;
    }

    manager
        .hooks_mut()
        .register(
            Hook::new("trace", "*", |ctx: &HookContext| {
                debug!(event = %ctx.event, args = ?ctx.args, "Hook event");
                Ok(())
            })
            .continue_on_error(),
        )
        .context("Failed to register tracing hook")?;

    Ok(manager)
}

/// Registered commands plus the paths that load on first use.
fn tree_dump(manager: &CommandManager, deferred: &[Vec<String>]) -> serde_json::Value {
    let tree = manager.tree();
    serde_json::json!({
        "commands": tree.summarize(tree.root()),
        "deferred": deferred,
    })
}

fn main() -> Result<ExitCode> {
    let mut cli = Cli::parse();
    let mut split = split_tokens(cli.command.iter().cloned());
    cli.absorb_globals(&mut split.assoc)?;
    init_logging(&cli);

    let deferred = demo::deferred_modules();
    let pending = deferred.pending_paths();
    let mut manager = build_manager(&cli, deferred)?;

    if cli.dump_tree {
        println!(
            "{}",
            serde_json::to_string_pretty(&tree_dump(&manager, &pending))?
        );
        return Ok(ExitCode::SUCCESS);
    }

    debug!(
        positional = ?split.positional,
        assoc = ?split.assoc,
        "Dispatching"
    );

    let status = manager.dispatch(split.positional, split.assoc);
    Ok(ExitCode::from(u8::try_from(status).unwrap_or(1)))
}
