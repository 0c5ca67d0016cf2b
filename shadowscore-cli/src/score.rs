//! Score subcommand - score a recording against a target sentence.

use crate::output::emit;
use eyre::{Context, Result};
use shadowscore::config::{EscalationConfig, ScoringContext, UncertaintyThresholds};
use shadowscore::pipelines::ScoringPipeline;
use shadowscore::recognizer::ReplayRecognizer;
use std::path::PathBuf;
use std::time::Instant;

/// CLI arguments for scoring.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to the learner's recording
    pub audio: PathBuf,

    /// Sentence the learner was asked to shadow
    #[arg(short, long)]
    pub target: String,

    /// Recorded recognizer response(s) for the recording, as JSON envelopes
    #[arg(long)]
    pub transcript: PathBuf,

    /// Language code (also selects the message language)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Course title used to derive recognition hints
    #[arg(long)]
    pub title: Option<String>,

    /// Recognizer model size to request
    #[arg(long)]
    pub model_size: Option<String>,

    /// Output report path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub escalation: EscalationConfig,

    #[command(flatten)]
    pub uncertainty: UncertaintyThresholds,
}

/// Resolved configuration for scoring.
#[derive(Debug)]
pub struct Config {
    pub audio: PathBuf,
    pub target: String,
    pub transcript: PathBuf,
    pub language: Option<String>,
    pub context: ScoringContext,
    pub output: Option<PathBuf>,
    pub escalation: EscalationConfig,
    pub uncertainty: UncertaintyThresholds,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        args.escalation
            .validate()
            .wrap_err("invalid escalation settings")?;
        args.uncertainty
            .validate()
            .wrap_err("invalid uncertainty settings")?;

        let mut context = ScoringContext::default();
        if let Some(title) = args.title {
            context = context.with_course_title(title);
        }
        if let Some(model_size) = args.model_size {
            context = context.with_model_size(model_size);
        }

        Ok(Self {
            audio: args.audio,
            target: args.target,
            transcript: args.transcript,
            language: args.language,
            context,
            output: args.output,
            escalation: args.escalation,
            uncertainty: args.uncertainty,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    tracing::info!(
        audio = ?config.audio.display(),
        transcript = ?config.transcript.display(),
        "scoring recording"
    );

    let recognizer = ReplayRecognizer::from_file(&config.transcript).wrap_err_with(|| {
        format!(
            "failed to load recognizer responses: {:?}",
            config.transcript.display()
        )
    })?;
    let pipeline = ScoringPipeline::with_config(recognizer, config.escalation, config.uncertainty)?;

    let started = Instant::now();

    let report = pipeline
        .score(
            &config.audio,
            &config.target,
            config.language.as_deref(),
            &config.context,
        )
        .wrap_err("scoring failed")?;

    tracing::info!(
        elapsed = ?started.elapsed(),
        content = ?report.scores.content,
        chosen = ?report.debug.asr_chosen,
        explanations = report.explanations.len(),
        "scoring completed"
    );

    emit(config.output.as_deref(), &report.to_json_pretty()?)
}
