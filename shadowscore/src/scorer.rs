//! Morphology-aware content score.

use crate::types::{DiffEdit, EditType, SuffixStatus};

/// Cost of a plain substitution, missing or inserted word.
pub const WORD_ERROR_COST: f64 = 1.0;

/// Cost of a substitution tagged as a dropped or added suffix.
pub const SUFFIX_COST: f64 = 0.25;

/// Cost of a substitution tagged as a swapped suffix.
pub const SUFFIX_SUBSTITUTION_COST: f64 = 0.35;

/// Cost one edit contributes to the word error total.
pub fn edit_cost(edit: &DiffEdit) -> f64 {
    match edit.kind {
        EditType::Match => 0.0,
        EditType::Substitution => match edit.meta.suffix_status() {
            Some(SuffixStatus::Substitution) => SUFFIX_SUBSTITUTION_COST,
            Some(_) => SUFFIX_COST,
            None => WORD_ERROR_COST,
        },
        EditType::Missing | EditType::Insertion => WORD_ERROR_COST,
    }
}

/// Content score in `0..=100` for `target_len` target tokens.
///
/// `round(100 * clamp(1 - cost / target_len, 0, 1))` with halves rounded to
/// even. An empty target has nothing to evaluate against and scores 0.
pub fn content_score(target_len: usize, edits: &[DiffEdit]) -> u8 {
    if target_len == 0 {
        return 0;
    }
    let total: f64 = edits.iter().map(edit_cost).sum();
    let ratio = (1.0 - total / target_len as f64).clamp(0.0, 1.0);
    (ratio * 100.0).round_ties_even() as u8
}
