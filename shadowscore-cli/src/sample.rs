//! Sample subcommand - write the built-in sample report.

use crate::output::emit;
use eyre::Result;
use shadowscore::report::sample_report;
use std::path::PathBuf;

/// CLI arguments for the sample report.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Output report path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Config {
    pub output: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            output: args.output,
        }
    }
}

pub fn execute(config: Config) -> Result<()> {
    emit(config.output.as_deref(), &sample_report().to_json_pretty()?)
}
