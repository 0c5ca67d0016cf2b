//! Tunable thresholds for escalation, uncertainty and timing.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Neutral content score at or above which no further attempts run.
const DEFAULT_ACCEPT_THRESHOLD: u8 = 98;

/// Biased content score below which the robust attempt runs.
const DEFAULT_ROBUST_THRESHOLD: u8 = 90;

const DEFAULT_NEUTRAL_BEAM: u32 = 5;
const DEFAULT_BIASED_BEAM: u32 = 10;
const DEFAULT_ROBUST_BEAM: u32 = 15;
const DEFAULT_TEMPERATURE: f64 = 0.0;

/// Mean segment log-probability strictly below this marks low confidence.
const DEFAULT_LOW_LOGPROB: f64 = -1.2;

/// Segment no-speech probability at or above this is flagged.
const DEFAULT_NO_SPEECH_PROB: f64 = 0.6;

/// Length of a span synthesized next to a single timed neighbor, in seconds.
pub const DEFAULT_SPAN_S: f64 = 0.12;

/// Score gap within which a confident alternative replaces a perfect but
/// low-confidence attempt.
///
/// Empirically tuned; recalibrate against real recordings before relying on it.
pub const LOW_CONFIDENCE_PERFECT_OVERRIDE_BAND: u8 = 1;

/// Attempt escalation policy.
#[derive(clap::Args, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Neutral score that accepts the first attempt without escalating
    #[arg(long, default_value_t = DEFAULT_ACCEPT_THRESHOLD)]
    pub accept_threshold: u8,

    /// Biased score below which the robust attempt runs
    #[arg(long, default_value_t = DEFAULT_ROBUST_THRESHOLD)]
    pub robust_threshold: u8,

    /// Beam width of the neutral attempt
    #[arg(long, default_value_t = DEFAULT_NEUTRAL_BEAM)]
    pub neutral_beam: u32,

    /// Beam width of the hint-biased attempt
    #[arg(long, default_value_t = DEFAULT_BIASED_BEAM)]
    pub biased_beam: u32,

    /// Beam width of the robust attempt
    #[arg(long, default_value_t = DEFAULT_ROBUST_BEAM)]
    pub robust_beam: u32,

    /// Decoding temperature forwarded with every attempt
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
            robust_threshold: DEFAULT_ROBUST_THRESHOLD,
            neutral_beam: DEFAULT_NEUTRAL_BEAM,
            biased_beam: DEFAULT_BIASED_BEAM,
            robust_beam: DEFAULT_ROBUST_BEAM,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("accept", self.accept_threshold),
            ("robust", self.robust_threshold),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        let beams = [self.neutral_beam, self.biased_beam, self.robust_beam];
        if beams.contains(&0) || beams.windows(2).any(|w| w[1] < w[0]) {
            return Err(ConfigError::InvalidBeamWidths {
                neutral: self.neutral_beam,
                biased: self.biased_beam,
                robust: self.robust_beam,
            });
        }

        Ok(())
    }
}

/// Thresholds that turn confidence signals into uncertainty flags.
#[derive(clap::Args, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyThresholds {
    /// Mean log-probability below which an attempt is low confidence
    #[arg(long, default_value_t = DEFAULT_LOW_LOGPROB, allow_negative_numbers = true)]
    pub low_logprob: f64,

    /// No-speech probability at or above which an attempt is flagged
    #[arg(long, default_value_t = DEFAULT_NO_SPEECH_PROB)]
    pub no_speech_prob: f64,
}

impl Default for UncertaintyThresholds {
    fn default() -> Self {
        Self {
            low_logprob: DEFAULT_LOW_LOGPROB,
            no_speech_prob: DEFAULT_NO_SPEECH_PROB,
        }
    }
}

impl UncertaintyThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.no_speech_prob) {
            return Err(ConfigError::InvalidNoSpeechThreshold(self.no_speech_prob));
        }
        Ok(())
    }

    pub fn is_low_confidence(&self, mean_avg_logprob: Option<f64>) -> bool {
        mean_avg_logprob.is_some_and(|lp| lp < self.low_logprob)
    }

    pub fn is_high_no_speech(&self, max_no_speech_prob: Option<f64>) -> bool {
        max_no_speech_prob.is_some_and(|p| p >= self.no_speech_prob)
    }
}

/// Optional caller context for one scoring call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringContext {
    /// Course or lesson title, used to derive recognition hints
    #[serde(default)]
    pub course_title: Option<String>,
    /// Model size forwarded to the recognizer
    #[serde(default)]
    pub asr_model_size: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ScoringContext {
    pub fn with_course_title(mut self, title: impl Into<String>) -> Self {
        self.course_title = Some(title.into());
        self
    }

    pub fn with_model_size(mut self, model_size: impl Into<String>) -> Self {
        self.asr_model_size = Some(model_size.into());
        self
    }

    /// Trimmed course title; blank titles count as absent.
    pub fn course_title(&self) -> Option<&str> {
        non_blank(&self.course_title)
    }

    pub fn model_size(&self) -> Option<&str> {
        non_blank(&self.asr_model_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(EscalationConfig::default().validate(), Ok(()));
        assert_eq!(UncertaintyThresholds::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = EscalationConfig {
            robust_threshold: 120,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidThreshold {
                name: "robust",
                value: 120
            })
        );
    }

    #[test]
    fn rejects_zero_or_shrinking_beams() {
        let zero = EscalationConfig {
            neutral_beam: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::InvalidBeamWidths { .. })
        ));

        let shrinking = EscalationConfig {
            robust_beam: 8,
            ..Default::default()
        };
        assert!(shrinking.validate().is_err());

        let equal = EscalationConfig {
            neutral_beam: 5,
            biased_beam: 5,
            robust_beam: 5,
            ..Default::default()
        };
        assert_eq!(equal.validate(), Ok(()));
    }

    #[test]
    fn uncertainty_threshold_edges() {
        let t = UncertaintyThresholds::default();
        assert!(!t.is_low_confidence(Some(-1.2)));
        assert!(t.is_low_confidence(Some(-1.21)));
        assert!(!t.is_low_confidence(None));
        assert!(t.is_high_no_speech(Some(0.6)));
        assert!(!t.is_high_no_speech(Some(0.59)));
        assert!(!t.is_high_no_speech(None));
    }

    #[test]
    fn rejects_no_speech_threshold_outside_unit_interval() {
        let t = UncertaintyThresholds {
            no_speech_prob: 1.5,
            ..Default::default()
        };
        assert_eq!(t.validate(), Err(ConfigError::InvalidNoSpeechThreshold(1.5)));
    }

    #[test]
    fn blank_context_values_are_absent() {
        let ctx = ScoringContext::default()
            .with_course_title("   ")
            .with_model_size(" small ");
        assert_eq!(ctx.course_title(), None);
        assert_eq!(ctx.model_size(), Some("small"));
    }
}
