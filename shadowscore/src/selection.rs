//! Picking the attempt to report.

use crate::attempt::Attempt;
use crate::config::LOW_CONFIDENCE_PERFECT_OVERRIDE_BAND;
use crate::types::{Extra, SelectionReason};

pub const STRATEGY: &str = "max_content_then_confidence";
pub const OVERRIDE_LOW_CONFIDENCE_PERFECT: &str =
    "avoid_low_confidence_perfect_when_close_alternative";

/// Chosen attempt and the recorded justification.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// Index into the attempts passed to [`select`]
    pub index: usize,
    pub reason: SelectionReason,
}

impl Selection {
    pub fn overridden(&self) -> bool {
        self.reason.override_reason.is_some()
    }
}

fn rank(attempt: &Attempt) -> (u8, bool, bool) {
    (
        attempt.content,
        !attempt.flags.low_confidence,
        !attempt.flags.high_no_speech_prob,
    )
}

/// First attempt maximizing `key`.
fn first_max_by<'a, K: Ord>(
    attempts: impl Iterator<Item = (usize, &'a Attempt)>,
    key: impl Fn(&Attempt) -> K,
) -> Option<usize> {
    attempts
        .map(|(i, a)| (i, key(a)))
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .map(|(i, _)| i)
}

fn reason_for(attempt: &Attempt) -> SelectionReason {
    SelectionReason {
        strategy: STRATEGY.to_string(),
        picked: attempt.name().to_string(),
        picked_content: attempt.content,
        picked_low_confidence: attempt.flags.low_confidence,
        picked_high_no_speech_prob: attempt.flags.high_no_speech_prob,
        override_reason: None,
        alt_name: None,
        alt_content: None,
        extra: Extra::new(),
    }
}

/// Pick the attempt with the highest content score, preferring confident
/// results on ties; earlier attempts win exact ties.
///
/// A perfect score from a low-confidence attempt is suspicious (silence
/// transcribed as a short match). When a confident attempt scores within
/// [`LOW_CONFIDENCE_PERFECT_OVERRIDE_BAND`] of it, that attempt is picked
/// instead and the override is recorded.
///
/// Returns `None` only for an empty slice.
pub fn select(attempts: &[Attempt]) -> Option<Selection> {
    let best = first_max_by(attempts.iter().enumerate(), rank)?;
    let picked = &attempts[best];

    if picked.content >= 100 && picked.flags.low_confidence {
        let confident = attempts
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.flags.low_confidence);
        if let Some(alt) = first_max_by(confident, |a| a.content) {
            let alternative = &attempts[alt];
            let floor = picked
                .content
                .saturating_sub(LOW_CONFIDENCE_PERFECT_OVERRIDE_BAND);
            if alternative.content >= floor {
                let reason = SelectionReason {
                    override_reason: Some(OVERRIDE_LOW_CONFIDENCE_PERFECT.to_string()),
                    alt_name: Some(alternative.name().to_string()),
                    alt_content: Some(alternative.content),
                    ..reason_for(alternative)
                };
                return Some(Selection { index: alt, reason });
            }
        }
    }

    Some(Selection {
        index: best,
        reason: reason_for(picked),
    })
}
