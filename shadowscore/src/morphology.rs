//! Suffix-aware reconciliation of substitution edits.
//!
//! A substitution whose two words differ only by an inflectional ending is
//! tagged as a suffix near-miss. Tagged edits are scored and reported more
//! leniently than unrelated word swaps.

use crate::types::{DiffEdit, EditMeta, EditType, MinorKind, SubToken, SubTokenStatus, SuffixStatus};

/// Candidate endings, tried in order.
pub const SUFFIXES: [&str; 5] = ["'s", "ing", "ed", "es", "s"];

/// Shortest stem a suffix may be stripped down to.
pub const MIN_STEM_LEN: usize = 3;

/// Stem and endings found by a detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuffixMatch<'a> {
    pub stem: &'a str,
    pub target_suffix: Option<&'static str>,
    pub hyp_suffix: Option<&'static str>,
}

type Detector = for<'a> fn(&'a str, &'a str) -> Option<SuffixMatch<'a>>;
type Tagger = for<'a> fn(SuffixMatch<'a>) -> EditMeta;

/// Ordered (detector, tagger) pairs; the first detector that fires wins.
const RULES: [(Detector, Tagger); 3] = [
    (detect_missing, tag_missing),
    (detect_inserted, tag_inserted),
    (detect_substituted, tag_substituted),
];

/// `target == hyp + suffix`: the speaker dropped an ending.
fn detect_missing<'a>(target: &'a str, hyp: &'a str) -> Option<SuffixMatch<'a>> {
    if hyp.len() < MIN_STEM_LEN {
        return None;
    }
    let rest = target.strip_prefix(hyp)?;
    let suffix = SUFFIXES.into_iter().find(|s| *s == rest)?;
    Some(SuffixMatch {
        stem: hyp,
        target_suffix: Some(suffix),
        hyp_suffix: None,
    })
}

/// `hyp == target + suffix`: the speaker added an ending.
fn detect_inserted<'a>(target: &'a str, hyp: &'a str) -> Option<SuffixMatch<'a>> {
    if target.len() < MIN_STEM_LEN {
        return None;
    }
    let rest = hyp.strip_prefix(target)?;
    let suffix = SUFFIXES.into_iter().find(|s| *s == rest)?;
    Some(SuffixMatch {
        stem: target,
        target_suffix: None,
        hyp_suffix: Some(suffix),
    })
}

/// Same stem, different endings on each side.
fn detect_substituted<'a>(target: &'a str, hyp: &'a str) -> Option<SuffixMatch<'a>> {
    SUFFIXES.into_iter().find_map(|suf_t| {
        let stem = target.strip_suffix(suf_t)?;
        if stem.len() < MIN_STEM_LEN {
            return None;
        }
        let hyp_rest = hyp.strip_prefix(stem)?;
        let suf_h = SUFFIXES
            .into_iter()
            .find(|suf_h| *suf_h != suf_t && *suf_h == hyp_rest)?;
        Some(SuffixMatch {
            stem,
            target_suffix: Some(suf_t),
            hyp_suffix: Some(suf_h),
        })
    })
}

fn suffix_meta(stem: &str, status: SuffixStatus) -> EditMeta {
    EditMeta {
        minor: true,
        minor_kind: Some(MinorKind::Suffix),
        stem: Some(stem.to_string()),
        suffix_status: Some(status),
        ..Default::default()
    }
}

fn tag_missing(m: SuffixMatch<'_>) -> EditMeta {
    let suffix = m.target_suffix.unwrap_or_default();
    EditMeta {
        suffix: Some(suffix.to_string()),
        subtokens: vec![
            SubToken::new(m.stem, SubTokenStatus::Match),
            SubToken::new(suffix, SubTokenStatus::MissingSuffix),
        ],
        ..suffix_meta(m.stem, SuffixStatus::Missing)
    }
}

fn tag_inserted(m: SuffixMatch<'_>) -> EditMeta {
    let suffix = m.hyp_suffix.unwrap_or_default();
    EditMeta {
        suffix: Some(suffix.to_string()),
        subtokens: vec![
            SubToken::new(m.stem, SubTokenStatus::Match),
            SubToken::new(suffix, SubTokenStatus::InsertionSuffix),
        ],
        ..suffix_meta(m.stem, SuffixStatus::Insertion)
    }
}

fn tag_substituted(m: SuffixMatch<'_>) -> EditMeta {
    let (suf_t, suf_h) = (
        m.target_suffix.unwrap_or_default(),
        m.hyp_suffix.unwrap_or_default(),
    );
    EditMeta {
        target_suffix: Some(suf_t.to_string()),
        hyp_suffix: Some(suf_h.to_string()),
        subtokens: vec![
            SubToken::new(m.stem, SubTokenStatus::Match),
            SubToken::new(suf_t, SubTokenStatus::MissingSuffix),
            SubToken::new(suf_h, SubTokenStatus::InsertionSuffix),
        ],
        ..suffix_meta(m.stem, SuffixStatus::Substitution)
    }
}

/// Suffix annotation for one target/hypothesis word pair, if any rule fires.
pub fn classify(target: &str, hyp: &str) -> Option<EditMeta> {
    let (t, h) = (target.trim().to_lowercase(), hyp.trim().to_lowercase());
    if t.is_empty() || h.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find_map(|&(detect, tag)| detect(&t, &h).map(tag))
}

/// Tag substitution edits that are pure suffix mismatches.
///
/// Other edit types and unrelated substitutions are left untouched. Fields
/// already present in an edit's `meta.extra` are kept.
pub fn reconcile(edits: &mut [DiffEdit]) {
    for edit in edits.iter_mut().filter(|e| e.kind == EditType::Substitution) {
        let (Some(t), Some(h)) = (edit.target_word.as_deref(), edit.hyp_word.as_deref()) else {
            continue;
        };
        if let Some(meta) = classify(t, h) {
            let extra = std::mem::take(&mut edit.meta.extra);
            edit.meta = EditMeta { extra, ..meta };
        }
    }
}
