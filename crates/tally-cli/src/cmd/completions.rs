use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

const BIN_NAME: &str = "tally";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    write_completions(shell, command, &mut stdout.lock())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) -> Result<()> {
    generate(shell, command, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
