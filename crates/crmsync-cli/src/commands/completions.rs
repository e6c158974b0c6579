use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

#[derive(Debug, clap::Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Writes the completion script for the `crmsync` binary to stdout.
pub fn emit(args: CompletionsArgs) -> Result<()> {
    let mut cmd = crate::Cli::command();
    let mut stdout = io::stdout().lock();
    generate(args.shell, &mut cmd, "crmsync", &mut stdout);
    Ok(())
}
