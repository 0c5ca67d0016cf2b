//! Hints subcommand - print the hints a biased attempt would use.

use eyre::Result;
use serde::Serialize;
use shadowscore::hints::Hints;

/// CLI arguments for hint derivation.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Target sentence
    #[arg(short, long)]
    pub target: String,

    /// Course title
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub target: String,
    pub title: Option<String>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            target: args.target,
            title: args.title,
        }
    }
}

#[derive(Debug, Serialize)]
struct HintsOutput {
    hotwords: Option<String>,
    initial_prompt: Option<String>,
}

impl From<Hints> for HintsOutput {
    fn from(hints: Hints) -> Self {
        Self {
            hotwords: hints.hotwords,
            initial_prompt: hints.initial_prompt,
        }
    }
}

pub fn execute(config: Config) -> Result<()> {
    let hints = Hints::build(&config.target, config.title.as_deref());
    if !hints.is_derivable() {
        tracing::warn!("no hints derivable; a biased attempt would be skipped");
    }
    let output = HintsOutput::from(hints);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
