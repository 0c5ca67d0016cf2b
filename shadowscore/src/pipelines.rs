//! High-level scoring pipeline.

use crate::attempt::{Attempt, AttemptKind, AttemptRunner};
use crate::audio::probe_wav;
use crate::config::{EscalationConfig, ScoringContext, UncertaintyThresholds};
use crate::error::{ConfigError, Error, RecognitionError, Result};
use crate::hints::Hints;
use crate::normalize::tokenize_words;
use crate::report::{self, DEFAULT_LANGUAGE, ReportInput};
use crate::selection::select;
use crate::traits::SpeechRecognizer;
use crate::types::{AudioAsset, ExplainableReport, RecognitionParams};
use std::path::Path;

/// Explainable scoring pipeline over a speech recognizer.
///
/// Each [`score`](Self::score) call is independent: the pipeline keeps no
/// state between calls, so one instance can serve many recordings and several
/// differently configured instances can coexist.
#[derive(Debug)]
pub struct ScoringPipeline<R> {
    recognizer: R,
    escalation: EscalationConfig,
    uncertainty: UncertaintyThresholds,
}

impl<R: SpeechRecognizer> ScoringPipeline<R> {
    /// Create a pipeline with default thresholds.
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            escalation: EscalationConfig::default(),
            uncertainty: UncertaintyThresholds::default(),
        }
    }

    /// Create a pipeline with custom thresholds.
    ///
    /// # Errors
    ///
    /// Returns error if a threshold or beam width is out of range.
    pub fn with_config(
        recognizer: R,
        escalation: EscalationConfig,
        uncertainty: UncertaintyThresholds,
    ) -> std::result::Result<Self, ConfigError> {
        escalation.validate()?;
        uncertainty.validate()?;
        Ok(Self {
            recognizer,
            escalation,
            uncertainty,
        })
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn escalation(&self) -> &EscalationConfig {
        &self.escalation
    }

    pub fn uncertainty(&self) -> &UncertaintyThresholds {
        &self.uncertainty
    }

    fn neutral_params(&self, model_size: Option<&str>) -> RecognitionParams {
        RecognitionParams {
            model_size: model_size.map(str::to_string),
            temperature: Some(self.escalation.temperature),
            beam_size: Some(self.escalation.neutral_beam),
            condition_on_previous_text: Some(true),
            ..Default::default()
        }
    }

    fn hinted_params(
        &self,
        model_size: Option<&str>,
        hints: &Hints,
        beam_size: u32,
        condition_on_previous_text: bool,
    ) -> RecognitionParams {
        RecognitionParams {
            hotwords: hints.hotwords.clone(),
            initial_prompt: hints.initial_prompt.clone(),
            beam_size: Some(beam_size),
            condition_on_previous_text: Some(condition_on_previous_text),
            ..self.neutral_params(model_size)
        }
    }

    /// Run the escalation policy, stopping at the first step whose condition
    /// is not met.
    ///
    /// Neutral always runs. Biased runs when neutral scores below the accept
    /// threshold, the target is non-empty and hints are derivable. Robust runs
    /// when biased scores below the robust threshold. A recognizer failure at
    /// any step aborts the call.
    pub fn run_attempts(
        &self,
        audio_path: &Path,
        target_words: &[String],
        target_text: &str,
        language: Option<&str>,
        context: &ScoringContext,
    ) -> std::result::Result<Vec<Attempt>, RecognitionError> {
        let runner = AttemptRunner {
            recognizer: &self.recognizer,
            audio_path,
            language,
            target_words,
            thresholds: &self.uncertainty,
        };
        let model_size = context.model_size();

        let neutral = runner.run(AttemptKind::Neutral, self.neutral_params(model_size))?;
        let neutral_content = neutral.content;
        let mut attempts = vec![neutral];

        if neutral_content >= self.escalation.accept_threshold || target_words.is_empty() {
            return Ok(attempts);
        }
        let hints = Hints::build(target_text, context.course_title());
        if !hints.is_derivable() {
            tracing::debug!("no hints derivable, skipping biased attempt");
            return Ok(attempts);
        }

        let biased = runner.run(
            AttemptKind::Biased,
            self.hinted_params(model_size, &hints, self.escalation.biased_beam, true),
        )?;
        let biased_content = biased.content;
        attempts.push(biased);

        if biased_content < self.escalation.robust_threshold {
            let robust = runner.run(
                AttemptKind::Robust,
                self.hinted_params(model_size, &hints, self.escalation.robust_beam, false),
            )?;
            attempts.push(robust);
        }

        Ok(attempts)
    }

    /// Score one recording of a learner reading `target_text`.
    ///
    /// # Errors
    ///
    /// Returns the recognizer's error unchanged if any recognition call fails.
    pub fn score<P: AsRef<Path>>(
        &self,
        audio_path: P,
        target_text: &str,
        language: Option<&str>,
        context: &ScoringContext,
    ) -> Result<ExplainableReport> {
        let audio_path = audio_path.as_ref();
        let span = tracing::info_span!("score", audio = %audio_path.display(), language);
        let _enter = span.enter();

        let target_words = tokenize_words(target_text);
        let attempts =
            self.run_attempts(audio_path, &target_words, target_text, language, context)?;

        let selection = select(&attempts).ok_or(Error::NoAttempts)?;
        let chosen = &attempts[selection.index];
        tracing::info!(
            chosen = chosen.name(),
            content = chosen.content,
            attempts = attempts.len(),
            overridden = selection.overridden(),
            "attempt selected"
        );

        let audio = audio_asset(audio_path, chosen.result.duration_s);

        Ok(report::assemble(ReportInput {
            target_text,
            target_words: &target_words,
            language: language.unwrap_or(DEFAULT_LANGUAGE),
            audio,
            attempts: &attempts,
            selection,
        }))
    }
}

/// Audio reference with the recognizer's duration, filled in from the WAV
/// header where possible.
fn audio_asset(audio_path: &Path, recognized_duration_s: Option<f64>) -> AudioAsset {
    let mut audio = AudioAsset::new(Some(audio_path.display().to_string()));
    audio.duration_s = recognized_duration_s;

    match probe_wav(audio_path) {
        Ok(info) => {
            audio.sample_rate = Some(info.sample_rate);
            audio.duration_s = audio.duration_s.or(Some(info.duration_s));
        }
        Err(e) => tracing::debug!(error = %e, "could not probe audio header"),
    }
    audio
}
