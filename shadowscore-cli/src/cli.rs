//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use eyre::Result;

#[derive(Debug, Parser)]
#[command(name = "shadow")]
#[command(about = "Explainable scoring for speech shadowing recordings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score a recording against its target sentence
    Score(crate::score::Args),

    /// Check that a saved report is readable by this version
    Check(crate::check::Args),

    /// Show the recognition hints derived for a target sentence
    Hints(crate::hints::Args),

    /// Write the built-in sample report
    Sample(crate::sample::Args),
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Score(args) => crate::score::execute(args.try_into()?),
        Commands::Check(args) => crate::check::execute(args.into()),
        Commands::Hints(args) => crate::hints::execute(args.into()),
        Commands::Sample(args) => crate::sample::execute(args.into()),
    }
}
