//! One recognizer invocation turned into a scored, aligned attempt.

use crate::align::{self, HypWord};
use crate::config::UncertaintyThresholds;
use crate::error::RecognitionError;
use crate::morphology;
use crate::normalize::normalize_word;
use crate::scorer;
use crate::timing;
use crate::traits::SpeechRecognizer;
use crate::types::{
    AttemptDiagnostics, DiffEdit, Extra, RecognitionParams, RecognitionResult, TimeSpan,
    UncertaintyFlags, WordAlignment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const NOTE_AVG_LOGPROB_LOW: &str = "avg_logprob_low";
pub const NOTE_NO_SPEECH_PROB_HIGH: &str = "no_speech_prob_high";

/// Escalation step an attempt belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    /// Plain decoding, no hints
    Neutral,
    /// Wider beam, biased with hotwords and prompt
    Biased,
    /// Widest beam, hints, no conditioning on previous text
    Robust,
}

impl AttemptKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Biased => "biased",
            Self::Robust => "robust",
        }
    }
}

impl fmt::Display for AttemptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one recognizer call, aligned and scored against the target.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    pub kind: AttemptKind,
    pub params: RecognitionParams,
    pub result: RecognitionResult,
    /// Normalized hypothesis words in recognizer order
    pub hyp_words: Vec<HypWord>,
    pub alignments: Vec<WordAlignment>,
    pub edits: Vec<DiffEdit>,
    pub content: u8,
    pub flags: UncertaintyFlags,
}

impl Attempt {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn hyp_tokens(&self) -> Vec<String> {
        self.hyp_words.iter().map(|w| w.word.clone()).collect()
    }

    pub fn diagnostics(&self) -> AttemptDiagnostics {
        AttemptDiagnostics {
            name: self.name().to_string(),
            content: self.content,
            avg_logprob: self.result.mean_avg_logprob(),
            max_no_speech_prob: self.result.max_no_speech_prob(),
            low_confidence: self.flags.low_confidence,
            high_no_speech_prob: self.flags.high_no_speech_prob,
            params: self.params.clone(),
            extra: Extra::new(),
        }
    }
}

/// Confidence flags for a recognition result.
pub fn uncertainty_flags(
    result: &RecognitionResult,
    thresholds: &UncertaintyThresholds,
) -> UncertaintyFlags {
    let mut flags = UncertaintyFlags::default();
    if thresholds.is_low_confidence(result.mean_avg_logprob()) {
        flags.low_confidence = true;
        flags.notes.push(NOTE_AVG_LOGPROB_LOW.to_string());
    }
    if thresholds.is_high_no_speech(result.max_no_speech_prob()) {
        flags.high_no_speech_prob = true;
        flags.notes.push(NOTE_NO_SPEECH_PROB_HIGH.to_string());
    }
    flags
}

/// Normalized hypothesis words and the timed alignments among them.
///
/// Each recognizer word contributes its first token; words that normalize to
/// nothing are dropped.
pub fn hypothesis_words(result: &RecognitionResult) -> (Vec<HypWord>, Vec<WordAlignment>) {
    let mut words = Vec::new();
    let mut alignments = Vec::new();

    for raw in result.words() {
        let Some(word) = normalize_word(&raw.word) else {
            continue;
        };
        let span = TimeSpan::from_bounds(raw.start_s, raw.end_s);
        if let Some(time_span) = span {
            alignments.push(WordAlignment {
                word: word.clone(),
                time_span,
                source: WordAlignment::ASR_SOURCE.to_string(),
                extra: Extra::new(),
            });
        }
        words.push(HypWord::new(word, span));
    }

    (words, alignments)
}

/// Runs single attempts against one recording and target.
pub struct AttemptRunner<'a, R: ?Sized> {
    pub recognizer: &'a R,
    pub audio_path: &'a Path,
    pub language: Option<&'a str>,
    pub target_words: &'a [String],
    pub thresholds: &'a UncertaintyThresholds,
}

impl<R: SpeechRecognizer + ?Sized> AttemptRunner<'_, R> {
    /// Call the recognizer once and score its output.
    ///
    /// A recognizer failure is returned as is.
    pub fn run(
        &self,
        kind: AttemptKind,
        params: RecognitionParams,
    ) -> Result<Attempt, RecognitionError> {
        let result = self
            .recognizer
            .transcribe(self.audio_path, self.language, &params)
            .inspect_err(|e| tracing::warn!(attempt = %kind, error = %e, "recognition failed"))?;

        let (hyp_words, alignments) = hypothesis_words(&result);
        let mut edits = align::align(self.target_words, &hyp_words);
        timing::fill_missing_spans(&mut edits, result.duration_s);
        morphology::reconcile(&mut edits);
        let content = scorer::content_score(self.target_words.len(), &edits);
        let flags = uncertainty_flags(&result, self.thresholds);

        tracing::debug!(
            attempt = %kind,
            content,
            hyp_words = hyp_words.len(),
            low_confidence = flags.low_confidence,
            high_no_speech_prob = flags.high_no_speech_prob,
            "attempt scored"
        );
        if flags.low_confidence || flags.high_no_speech_prob {
            tracing::warn!(attempt = %kind, notes = ?flags.notes, "attempt flagged uncertain");
        }

        Ok(Attempt {
            kind,
            params,
            result,
            hyp_words,
            alignments,
            edits,
            content,
            flags,
        })
    }
}
