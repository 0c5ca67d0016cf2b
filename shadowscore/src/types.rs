//! Core types for shadowscore.
//!
//! Every document type keeps unrecognized fields in a flattened `extra` map so
//! that a report or bundle written by a newer producer survives a round trip
//! through this crate unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unrecognized fields preserved across (de)serialization.
pub type Extra = Map<String, Value>;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Closed time interval in seconds.
///
/// Bounds are never negative and `end_s >= start_s`; reversed bounds are
/// swapped on construction and on deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTimeSpan")]
pub struct TimeSpan {
    pub start_s: f64,
    pub end_s: f64,
}

#[derive(Deserialize)]
struct RawTimeSpan {
    start_s: f64,
    end_s: f64,
}

impl From<RawTimeSpan> for TimeSpan {
    fn from(raw: RawTimeSpan) -> Self {
        Self::new(raw.start_s, raw.end_s)
    }
}

impl TimeSpan {
    pub fn new(start_s: f64, end_s: f64) -> Self {
        let (start_s, end_s) = if end_s < start_s {
            (end_s, start_s)
        } else {
            (start_s, end_s)
        };
        Self {
            start_s: start_s.max(0.0),
            end_s: end_s.max(0.0),
        }
    }

    /// Build a span from optional recognizer timestamps.
    ///
    /// Returns `None` when either bound is missing, negative or not finite.
    pub fn from_bounds(start_s: Option<f64>, end_s: Option<f64>) -> Option<Self> {
        let (s, e) = (start_s?, end_s?);
        if !s.is_finite() || !e.is_finite() || s < 0.0 || e < 0.0 {
            return None;
        }
        Some(Self::new(s, e))
    }

    pub fn duration_s(&self) -> f64 {
        (self.end_s - self.start_s).max(0.0)
    }
}

/// Reference to the scored recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub duration_s: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl AudioAsset {
    pub fn new(path: Option<String>) -> Self {
        Self {
            id: new_id(),
            path,
            sample_rate: None,
            duration_s: None,
            extra: Extra::new(),
        }
    }
}

/// One recognized word with optional timing and confidence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionWord {
    pub word: String,
    #[serde(default)]
    pub start_s: Option<f64>,
    #[serde(default)]
    pub end_s: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl RecognitionWord {
    pub fn new(word: impl Into<String>, start_s: f64, end_s: f64) -> Self {
        Self {
            word: word.into(),
            start_s: Some(start_s),
            end_s: Some(end_s),
            ..Default::default()
        }
    }
}

/// Recognized segment carrying per-segment confidence signals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSegment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub start_s: Option<f64>,
    #[serde(default)]
    pub end_s: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<RecognitionWord>,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    #[serde(default)]
    pub no_speech_prob: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Full output of one recognizer invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Vec<RecognitionSegment>,
    /// Total audio duration, when the recognizer reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl RecognitionResult {
    /// Iterate all words across segments in order.
    pub fn words(&self) -> impl Iterator<Item = &RecognitionWord> {
        self.segments.iter().flat_map(|seg| seg.words.iter())
    }

    /// Mean of the segments' `avg_logprob`, ignoring segments without one.
    pub fn mean_avg_logprob(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .segments
            .iter()
            .filter_map(|seg| seg.avg_logprob)
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn max_no_speech_prob(&self) -> Option<f64> {
        self.segments
            .iter()
            .filter_map(|seg| seg.no_speech_prob)
            .reduce(f64::max)
    }
}

/// Parameter set forwarded to the recognizer for one attempt.
///
/// Only these names are accepted by a capability; unset values are not forwarded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vad_filter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vad_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotwords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_on_previous_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_size: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl RecognitionParams {
    /// Names of the parameters that are set, in declaration order.
    pub fn forwarded_names(&self) -> Vec<&'static str> {
        [
            ("model_size", self.model_size.is_some()),
            ("vad_filter", self.vad_filter.is_some()),
            ("vad_parameters", self.vad_parameters.is_some()),
            ("initial_prompt", self.initial_prompt.is_some()),
            ("hotwords", self.hotwords.is_some()),
            ("prefix", self.prefix.is_some()),
            ("chunk_length", self.chunk_length.is_some()),
            (
                "condition_on_previous_text",
                self.condition_on_previous_text.is_some(),
            ),
            ("temperature", self.temperature.is_some()),
            ("beam_size", self.beam_size.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Timed hypothesis word with its provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordAlignment {
    pub word: String,
    pub time_span: TimeSpan,
    #[serde(default = "default_alignment_source")]
    pub source: String,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_alignment_source() -> String {
    WordAlignment::ASR_SOURCE.to_string()
}

impl WordAlignment {
    /// Provenance of spans taken directly from recognizer word timestamps.
    pub const ASR_SOURCE: &'static str = "asr";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Match,
    Substitution,
    Missing,
    Insertion,
}

impl EditType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Substitution => "substitution",
            Self::Missing => "missing",
            Self::Insertion => "insertion",
        }
    }

    /// Whether an edit of this type consumes a hypothesis word and so carries
    /// the recognizer's timing.
    pub const fn is_anchored(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorKind {
    Suffix,
}

/// How a word ending differs between target and hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixStatus {
    /// Target has a suffix the speaker dropped
    Missing,
    /// Speaker added a suffix the target lacks
    Insertion,
    /// Both carry a suffix on the same stem, but different ones
    Substitution,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTokenStatus {
    Match,
    MissingSuffix,
    InsertionSuffix,
}

/// Display fragment of a suffix-tagged word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubToken {
    pub text: String,
    pub status: SubTokenStatus,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SubToken {
    pub fn new(text: impl Into<String>, status: SubTokenStatus) -> Self {
        Self {
            text: text.into(),
            status,
            extra: Extra::new(),
        }
    }
}

/// Annotations attached to an edit, mostly by morphology reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditMeta {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub minor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_kind: Option<MinorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix_status: Option<SuffixStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyp_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtokens: Vec<SubToken>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl EditMeta {
    pub fn is_suffix_tagged(&self) -> bool {
        self.minor_kind == Some(MinorKind::Suffix)
    }

    /// Suffix status, only when the edit is tagged as a suffix near-miss.
    pub fn suffix_status(&self) -> Option<SuffixStatus> {
        self.suffix_status.filter(|_| self.is_suffix_tagged())
    }
}

/// One aligned unit between target and hypothesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffEdit {
    #[serde(rename = "type")]
    pub kind: EditType,
    #[serde(default)]
    pub target_word: Option<String>,
    #[serde(default)]
    pub hyp_word: Option<String>,
    #[serde(default)]
    pub time_span: Option<TimeSpan>,
    #[serde(default)]
    pub meta: EditMeta,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DiffEdit {
    fn new(
        kind: EditType,
        target_word: Option<String>,
        hyp_word: Option<String>,
        time_span: Option<TimeSpan>,
    ) -> Self {
        Self {
            kind,
            target_word,
            hyp_word,
            time_span,
            meta: EditMeta::default(),
            extra: Extra::new(),
        }
    }

    pub fn matched(
        target: impl Into<String>,
        hyp: impl Into<String>,
        span: Option<TimeSpan>,
    ) -> Self {
        Self::new(EditType::Match, Some(target.into()), Some(hyp.into()), span)
    }

    pub fn substitution(
        target: impl Into<String>,
        hyp: impl Into<String>,
        span: Option<TimeSpan>,
    ) -> Self {
        Self::new(
            EditType::Substitution,
            Some(target.into()),
            Some(hyp.into()),
            span,
        )
    }

    pub fn missing(target: impl Into<String>) -> Self {
        Self::new(EditType::Missing, Some(target.into()), None, None)
    }

    pub fn insertion(hyp: impl Into<String>, span: Option<TimeSpan>) -> Self {
        Self::new(EditType::Insertion, None, Some(hyp.into()), span)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Word,
    Pause,
    Divergence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Display metadata of a timeline region.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EditType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_ms: Option<u32>,
    #[serde(flatten)]
    pub edit: EditMeta,
}

/// Time-anchored annotation rendered over a waveform or video scrubber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineRegion {
    #[serde(default = "new_id")]
    pub id: String,
    pub kind: RegionKind,
    pub time_span: TimeSpan,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub meta: RegionMeta,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TimelineRegion {
    pub fn new(kind: RegionKind, time_span: TimeSpan, label: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            time_span,
            label: label.into(),
            severity: None,
            meta: RegionMeta::default(),
            extra: Extra::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayers {
    #[serde(default)]
    pub word_regions: Vec<TimelineRegion>,
    #[serde(default)]
    pub pause_regions: Vec<TimelineRegion>,
    #[serde(default)]
    pub divergence_regions: Vec<TimelineRegion>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Evidence backing an explanation, normally the originating edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<DiffEdit>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Localized, human-readable finding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default = "new_id")]
    pub id: String,
    /// Dotted category such as `content.missing`.
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub time_span: Option<TimeSpan>,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Top-level 0–100 scores. `fluency` and `pronunciation` are reserved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default)]
    pub overall: Option<u8>,
    #[serde(default)]
    pub content: Option<u8>,
    #[serde(default)]
    pub fluency: Option<u8>,
    #[serde(default)]
    pub pronunciation: Option<u8>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Signals that a recognition result may be unreliable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyFlags {
    #[serde(default)]
    pub low_confidence: bool,
    #[serde(default)]
    pub high_no_speech_prob: bool,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Per-attempt diagnostics recorded in the report's debug payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptDiagnostics {
    pub name: String,
    pub content: u8,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    #[serde(default)]
    pub max_no_speech_prob: Option<f64>,
    #[serde(default)]
    pub low_confidence: bool,
    #[serde(default)]
    pub high_no_speech_prob: bool,
    #[serde(default)]
    pub params: RecognitionParams,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Why an attempt was kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionReason {
    pub strategy: String,
    pub picked: String,
    pub picked_content: u8,
    pub picked_low_confidence: bool,
    pub picked_high_no_speech_prob: bool,
    #[serde(
        rename = "override",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub override_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_content: Option<u8>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Versioned bundle of everything needed to reproduce a report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IRBundle {
    pub ir_version: String,
    pub audio: AudioAsset,
    pub target_text: String,
    #[serde(default)]
    pub asr: Option<RecognitionResult>,
    #[serde(default)]
    pub alignments: Vec<WordAlignment>,
    #[serde(default)]
    pub diff_edits: Vec<DiffEdit>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hyp_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asr_attempts: Vec<AttemptDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asr_chosen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asr_choose_reason: Option<SelectionReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<IRBundle>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Versioned, serializable scoring report handed to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplainableReport {
    pub schema_version: String,
    pub ir_version: String,
    #[serde(default = "now_rfc3339")]
    pub created_at: String,
    pub scores: Scores,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
    #[serde(default)]
    pub timeline_layers: TimelineLayers,
    #[serde(default)]
    pub uncertainty_flags: UncertaintyFlags,
    #[serde(default)]
    pub audio: Option<AudioAsset>,
    #[serde(default)]
    pub debug: DebugPayload,
    #[serde(flatten)]
    pub extra: Extra,
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl ExplainableReport {
    /// Check both version stamps against the versions this crate produces.
    pub fn is_compatible(&self) -> bool {
        crate::versions::is_schema_compatible(&self.schema_version)
            && crate::versions::is_ir_compatible(&self.ir_version)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
