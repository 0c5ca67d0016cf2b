//! Time spans for edits that have no direct timing evidence.
//!
//! Missing words were never heard, so the recognizer gives them no timestamps.
//! Their spans are reconstructed from the nearest anchored neighbors.

use crate::config::DEFAULT_SPAN_S;
use crate::types::{DiffEdit, EditType, TimeSpan};

/// Span between the end of the previous anchor and the start of the next.
///
/// With one neighbor, a `default_s` long span is placed next to it. Spans that
/// run past the end are clipped to `duration_s` when it is known; nothing is
/// clipped otherwise.
pub fn span_between(
    prev_end: Option<f64>,
    next_start: Option<f64>,
    duration_s: Option<f64>,
    default_s: f64,
) -> Option<TimeSpan> {
    let clip = |end: f64| duration_s.map_or(end, |d| end.min(d));

    match (prev_end, next_start) {
        (None, None) => None,
        (None, Some(next)) => Some(TimeSpan::new((next - default_s).max(0.0), next)),
        (Some(prev), None) => Some(TimeSpan::new(prev, clip(prev + default_s))),
        (Some(prev), Some(next)) if next <= prev => {
            Some(TimeSpan::new(prev, clip(prev + default_s)))
        }
        (Some(prev), Some(next)) => Some(TimeSpan::new(prev, next)),
    }
}

/// Start time of an edit that consumes a hypothesis word and carries timing.
fn anchor(edit: &DiffEdit) -> Option<TimeSpan> {
    edit.time_span.filter(|_| edit.kind.is_anchored())
}

/// Assign spans to untimed missing edits from their anchored neighbors.
///
/// Only recognizer-timed edits act as anchors; spans synthesized here never
/// anchor a later missing edit. With no anchors at all the edits stay untimed.
pub fn fill_missing_spans(edits: &mut [DiffEdit], duration_s: Option<f64>) {
    let mut next_start = vec![None; edits.len()];
    let mut upcoming = None;
    for (i, edit) in edits.iter().enumerate().rev() {
        if let Some(span) = anchor(edit) {
            upcoming = Some(span.start_s);
        }
        next_start[i] = upcoming;
    }

    let mut last_end = None;
    for (edit, next) in edits.iter_mut().zip(next_start) {
        if let Some(span) = anchor(edit) {
            last_end = Some(span.end_s);
            continue;
        }
        if edit.kind == EditType::Missing && edit.time_span.is_none() {
            edit.time_span = span_between(last_end, next, duration_s, DEFAULT_SPAN_S);
        }
    }
}
