//! devai-cli: conventional commit messages from staged changes, generated by a
//! local Ollama model.
//!
//! `setup` provisions the daemon's models once; `commit` generates, previews,
//! and commits a message for the staged diff.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use devai::commit::{CommitOptions, CommitOutcome, CommitWorkflow};
use devai::core::types::GenerationOptions;
use devai::error::DevaiError;
use devai::exit_codes;
use devai::io::config::{CONFIG_ENV, DevaiConfig, OLLAMA_HOST_ENV, config_path, load_config};
use devai::io::editor::ShellEditor;
use devai::io::git::Git;
use devai::io::ollama::OllamaClient;
use devai::io::terminal::{ConsoleSetupRenderer, TerminalUi};
use devai::logging;
use devai::setup::Provisioner;

#[derive(Parser)]
#[command(
    name = "devai-cli",
    version,
    about = "Generate conventional commit messages with a local Ollama model"
)]
struct Cli {
    /// Config file (defaults to `$DEVAI_CONFIG`, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a commit message for the staged diff and commit it.
    Commit {
        /// Stage all changes (`git add -A`) before generating.
        #[arg(short = 'a', long)]
        all: bool,
        /// Extra guidance for the model, e.g. a ticket or intent.
        #[arg(long, value_name = "TEXT")]
        context: Option<String>,
    },
    /// Check the Ollama daemon and provision the base and commit models.
    Setup,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return exit_codes::INVALID;
        }
    };

    let result = match cli.command {
        Command::Commit { all, context } => cmd_commit(
            &config,
            CommitOptions {
                stage_all: all,
                user_context: context,
            },
        ),
        Command::Setup => cmd_setup(&config),
    };
    match result {
        Ok(()) => exit_codes::OK,
        Err(err) => report(&err),
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<DevaiConfig> {
    let config = match config_path(explicit, std::env::var(CONFIG_ENV).ok()) {
        Some(path) => load_config(&path)?,
        None => DevaiConfig::default(),
    };
    let config = config.with_host_override(std::env::var(OLLAMA_HOST_ENV).ok());
    config.validate()?;
    Ok(config)
}

fn ollama_client(config: &DevaiConfig) -> Result<OllamaClient, DevaiError> {
    OllamaClient::new(
        config.ollama.host.as_str(),
        Duration::from_secs(config.ollama.request_timeout_secs),
    )
    .map_err(unexpected)
}

fn cmd_commit(config: &DevaiConfig, options: CommitOptions) -> Result<(), DevaiError> {
    let cwd = std::env::current_dir().map_err(|err| unexpected(err.into()))?;
    let git = Git::new(cwd);
    let client = ollama_client(config)?;
    let git_dir = git.git_dir().unwrap_or_else(|_| PathBuf::from(".git"));
    let editor = ShellEditor::from_env(git_dir);
    let generation = GenerationOptions {
        keep_alive: Some(config.model.keep_alive),
        ..GenerationOptions::for_model(config.model.name.as_str())
    };

    let mut ui = TerminalUi::new(io::stdout());
    let outcome = CommitWorkflow::new(&git, &client, &editor, generation, options).run(&mut ui)?;
    print_outcome(&mut ui.into_output(), &outcome).map_err(unexpected)
}

fn print_outcome(out: &mut impl Write, outcome: &CommitOutcome) -> Result<()> {
    match outcome {
        CommitOutcome::Committed(message) => {
            let subject = message.lines().next().unwrap_or_default();
            writeln!(out, "Committed: {subject}")
        }
        CommitOutcome::Cancelled => writeln!(out, "Commit cancelled"),
    }
    .context("write commit summary")
}

fn cmd_setup(config: &DevaiConfig) -> Result<(), DevaiError> {
    let client = ollama_client(config)?;
    let mut renderer = ConsoleSetupRenderer::new(io::stdout());
    Provisioner::new(&client, &config.model).run(&mut renderer)?;
    Ok(())
}

fn unexpected(err: anyhow::Error) -> DevaiError {
    DevaiError::unexpected("Unexpected error occurred", format!("{err:#}"))
}

/// Print the error for the user and return its exit code.
fn report(err: &DevaiError) -> i32 {
    eprintln!("Error: {err}");
    if let Some(remediation) = err.remediation() {
        eprintln!("\n{remediation}");
    }
    if matches!(err, DevaiError::Unexpected { .. }) {
        write_debug_log(err);
    }
    err.exit_code()
}

fn write_debug_log(err: &DevaiError) {
    let Some(path) = logging::debug_log_path() else {
        return;
    };
    match logging::append_debug_log(&path, err) {
        Ok(()) => eprintln!("\nDetails written to {}", path.display()),
        Err(log_err) => warn!(error = %format!("{log_err:#}"), "failed to write debug log"),
    }
}
