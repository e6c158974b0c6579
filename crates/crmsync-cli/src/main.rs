mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{auth_url, completions, normalize, platforms, sync, validate, Context};
use crate::error::{exit_code_for, report_error};
use crmsync_config as config;

#[derive(Debug, Parser)]
#[command(name = "crmsync", version, about = "Sync CRM contacts into SimplyCast lists")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List supported platforms
    Platforms,
    /// Check configured credentials without network access
    Validate(validate::ValidateArgs),
    Sync(sync::SyncArgs),
    /// Normalize a JSON file of contacts with the configured rules
    Normalize(normalize::NormalizeArgs),
    /// Print the Salesforce authorization URL
    #[command(name = "auth-url")]
    AuthUrl,
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    if let Command::Completions(args) = command {
        return completions::emit(args);
    }

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let ctx = Context {
        json,
        config: &app_config,
    };

    match command {
        Command::Platforms => platforms::list_platforms(&ctx),
        Command::Validate(args) => validate::validate(&ctx, args),
        Command::Sync(args) => sync::sync(&ctx, args),
        Command::Normalize(args) => normalize::normalize(&ctx, args),
        Command::AuthUrl => auth_url::print_auth_url(&ctx),
        Command::Completions(_) => unreachable!("completions handled before config load"),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
