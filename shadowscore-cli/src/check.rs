//! Check subcommand - verify a saved report's version stamps.

use color_eyre::Section;
use eyre::{Context, Result, eyre};
use shadowscore::types::ExplainableReport;
use shadowscore::versions::{IR_VERSION, SCHEMA_VERSION};
use std::path::PathBuf;

/// CLI arguments for report checking.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to a report JSON file
    pub report: PathBuf,
}

/// Resolved configuration for report checking.
#[derive(Debug)]
pub struct Config {
    pub report: PathBuf,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            report: args.report,
        }
    }
}

pub fn execute(config: Config) -> Result<()> {
    let json = std::fs::read_to_string(&config.report)
        .wrap_err_with(|| format!("failed to read report: {:?}", config.report.display()))?;
    let report = ExplainableReport::from_json(&json)
        .wrap_err_with(|| format!("failed to parse report: {:?}", config.report.display()))?;

    if !report.is_compatible() {
        let e = eyre!(
            "report versions schema={} ir={} are not compatible with schema={} ir={}",
            report.schema_version,
            report.ir_version,
            SCHEMA_VERSION,
            IR_VERSION
        )
        .suggestion("re-score the recording with this version of shadow");
        return Err(e);
    }

    tracing::info!(
        schema_version = %report.schema_version,
        ir_version = %report.ir_version,
        content = ?report.scores.content,
        "report is compatible"
    );
    println!(
        "{}: compatible (schema {}, ir {})",
        config.report.display(),
        report.schema_version,
        report.ir_version
    );
    Ok(())
}
