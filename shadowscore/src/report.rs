//! Report assembly: timeline regions, localized explanations and the debug
//! payload around the chosen attempt.

use crate::attempt::Attempt;
use crate::selection::Selection;
use crate::types::{
    AudioAsset, DebugPayload, DiffEdit, EditType, Evidence, ExplainableReport, Explanation, Extra,
    IRBundle, RegionKind, RegionMeta, Scores, Severity, SuffixStatus, TimeSpan, TimelineLayers,
    TimelineRegion, UncertaintyFlags, new_id, now_rfc3339,
};
use crate::versions::{IR_VERSION, SCHEMA_VERSION};
use serde_json::json;

/// Language used when the caller gives none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language of explanation messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// `zh*` language codes get Chinese messages, everything else English.
    pub fn from_language(language: &str) -> Self {
        if language.starts_with("zh") {
            Self::Zh
        } else {
            Self::En
        }
    }
}

pub fn severity(edit: &DiffEdit) -> Severity {
    match edit.kind {
        EditType::Match => Severity::Info,
        EditType::Substitution if edit.meta.is_suffix_tagged() => Severity::Info,
        EditType::Substitution => Severity::Warning,
        EditType::Missing | EditType::Insertion => Severity::Error,
    }
}

fn suffix_message(locale: Locale, edit: &DiffEdit) -> Option<String> {
    let meta = &edit.meta;
    let suffix = meta.suffix.as_deref().filter(|s| !s.is_empty());
    let message = match (meta.suffix_status()?, locale) {
        (SuffixStatus::Missing, Locale::Zh) => {
            format!("词尾可能没读出来（-{}）", suffix?)
        }
        (SuffixStatus::Missing, Locale::En) => format!("Maybe missed suffix (-{})", suffix?),
        (SuffixStatus::Insertion, Locale::Zh) => {
            format!("词尾可能多带了（-{}）", suffix?)
        }
        (SuffixStatus::Insertion, Locale::En) => format!("Maybe added suffix (-{})", suffix?),
        (SuffixStatus::Substitution, locale) => {
            let t = meta.target_suffix.as_deref().filter(|s| !s.is_empty())?;
            let h = meta.hyp_suffix.as_deref().filter(|s| !s.is_empty())?;
            match locale {
                Locale::Zh => format!("词尾可能读错了（-{t}→-{h}）"),
                Locale::En => format!("Maybe confused suffix (-{t}→-{h})"),
            }
        }
    };
    Some(message)
}

/// Localized one-line description of a non-match edit.
pub fn message(locale: Locale, edit: &DiffEdit) -> String {
    if edit.kind == EditType::Substitution
        && let Some(message) = suffix_message(locale, edit)
    {
        return message;
    }

    let target = edit.target_word.as_deref().unwrap_or_default();
    let hyp = edit.hyp_word.as_deref().unwrap_or_default();
    match (edit.kind, locale) {
        (EditType::Missing, Locale::Zh) => format!("可能漏读了 \"{target}\""),
        (EditType::Missing, Locale::En) => format!("Maybe missed \"{target}\""),
        (EditType::Insertion, Locale::Zh) => format!("可能多读了 \"{hyp}\""),
        (EditType::Insertion, Locale::En) => format!("Maybe inserted \"{hyp}\""),
        (EditType::Substitution, Locale::Zh) => {
            format!("可能把 \"{target}\" 读成了 \"{hyp}\"")
        }
        (EditType::Substitution, Locale::En) => {
            format!("Maybe said \"{hyp}\" instead of \"{target}\"")
        }
        (EditType::Match, _) => String::new(),
    }
}

/// One word region per timed edit.
pub fn word_regions(edits: &[DiffEdit]) -> Vec<TimelineRegion> {
    edits
        .iter()
        .filter_map(|edit| {
            let span = edit.time_span?;
            let label = match edit.kind {
                EditType::Insertion => edit.hyp_word.clone(),
                _ => edit.target_word.clone(),
            };
            let mut region = TimelineRegion::new(RegionKind::Word, span, label.unwrap_or_default());
            region.severity = Some(severity(edit));
            region.meta = RegionMeta {
                status: Some(edit.kind),
                target: edit.target_word.clone(),
                hyp: edit.hyp_word.clone(),
                pause_ms: None,
                edit: edit.meta.clone(),
            };
            Some(region)
        })
        .collect()
}

/// One explanation per non-match edit, carrying the edit as evidence.
pub fn explanations(edits: &[DiffEdit], locale: Locale) -> Vec<Explanation> {
    edits
        .iter()
        .filter(|edit| edit.kind != EditType::Match)
        .map(|edit| Explanation {
            id: new_id(),
            kind: format!("content.{}", edit.kind),
            severity: severity(edit),
            message: message(locale, edit),
            time_span: edit.time_span,
            evidence: Evidence {
                edit: Some(edit.clone()),
                extra: Extra::new(),
            },
            extra: Extra::new(),
        })
        .collect()
}

/// Everything the assembler needs from one scoring call.
pub struct ReportInput<'a> {
    pub target_text: &'a str,
    pub target_words: &'a [String],
    pub language: &'a str,
    pub audio: AudioAsset,
    pub attempts: &'a [Attempt],
    pub selection: Selection,
}

/// Build the versioned report around the selected attempt.
pub fn assemble(input: ReportInput<'_>) -> ExplainableReport {
    let chosen = &input.attempts[input.selection.index];
    let locale = Locale::from_language(input.language);

    let timeline_layers = TimelineLayers {
        word_regions: word_regions(&chosen.edits),
        ..Default::default()
    };

    let ir = IRBundle {
        ir_version: IR_VERSION.to_string(),
        audio: input.audio.clone(),
        target_text: input.target_text.to_string(),
        asr: Some(chosen.result.clone()),
        alignments: chosen.alignments.clone(),
        diff_edits: chosen.edits.clone(),
        extra: Extra::new(),
    };

    ExplainableReport {
        schema_version: SCHEMA_VERSION.to_string(),
        ir_version: IR_VERSION.to_string(),
        created_at: now_rfc3339(),
        scores: Scores {
            overall: Some(chosen.content),
            content: Some(chosen.content),
            ..Default::default()
        },
        explanations: explanations(&chosen.edits, locale),
        timeline_layers,
        uncertainty_flags: chosen.flags.clone(),
        audio: Some(input.audio),
        debug: DebugPayload {
            target_words: input.target_words.to_vec(),
            hyp_words: chosen.hyp_tokens(),
            asr_attempts: input.attempts.iter().map(Attempt::diagnostics).collect(),
            asr_chosen: Some(chosen.name().to_string()),
            asr_choose_reason: Some(input.selection.reason),
            ir: Some(ir),
            extra: Extra::new(),
        },
        extra: Extra::new(),
    }
}

fn sample_word(start_s: f64, end_s: f64, label: &str, edit: &DiffEdit) -> TimelineRegion {
    let mut region = TimelineRegion::new(RegionKind::Word, TimeSpan::new(start_s, end_s), label);
    region.severity = Some(severity(edit));
    region.meta = RegionMeta {
        status: Some(edit.kind),
        target: edit.target_word.clone().filter(|_| edit.kind != EditType::Match),
        hyp: edit.hyp_word.clone().filter(|_| edit.kind == EditType::Substitution),
        ..Default::default()
    };
    region
}

fn sample_pause(start_s: f64, end_s: f64, pause_ms: u32, severity: Severity) -> TimelineRegion {
    let mut region = TimelineRegion::new(
        RegionKind::Pause,
        TimeSpan::new(start_s, end_s),
        format!("pause {pause_ms}ms"),
    );
    region.severity = Some(severity);
    region.meta.pause_ms = Some(pause_ms);
    region
}

/// Fixed demonstration report for building UIs against the schema.
///
/// Target "I want to buy milk": "buy" heard as "by", "milk" dropped, and a
/// long pause after "buy".
pub fn sample_report() -> ExplainableReport {
    const DURATION_S: f64 = 3.2;

    let buy = DiffEdit::substitution("buy", "by", Some(TimeSpan::new(1.29, 1.95)));
    let mut milk = DiffEdit::missing("milk");
    milk.time_span = Some(TimeSpan::new(1.96, 2.60));

    let word_regions = vec![
        sample_word(0.10, 0.45, "I", &DiffEdit::matched("i", "i", None)),
        sample_word(0.46, 0.92, "want", &DiffEdit::matched("want", "want", None)),
        sample_word(0.93, 1.28, "to", &DiffEdit::matched("to", "to", None)),
        sample_word(1.29, 1.95, "buy", &buy),
        sample_word(1.96, 2.60, "milk", &milk),
    ];
    let pause_regions = vec![
        sample_pause(0.92, 1.05, 130, Severity::Info),
        sample_pause(1.95, 2.25, 300, Severity::Warning),
    ];

    let content_explanation = |edit: &DiffEdit, message: String| Explanation {
        id: new_id(),
        kind: format!("content.{}", edit.kind),
        severity: severity(edit),
        message,
        time_span: edit.time_span,
        evidence: Evidence {
            edit: Some(edit.clone()),
            extra: Extra::new(),
        },
        extra: Extra::new(),
    };

    let mut pause_evidence = Extra::new();
    pause_evidence.insert("vad".to_string(), json!({ "pause_ms": 300 }));

    let explanations = vec![
        content_explanation(
            &buy,
            "可能把 \"buy\" 读成了近音词（例如 \"by\"）".to_string(),
        ),
        content_explanation(&milk, message(Locale::Zh, &milk)),
        Explanation {
            id: new_id(),
            kind: "fluency.pause".to_string(),
            severity: Severity::Warning,
            message: "在 buy 后停顿偏长（300ms）".to_string(),
            time_span: Some(TimeSpan::new(1.95, 2.25)),
            evidence: Evidence {
                edit: None,
                extra: pause_evidence,
            },
            extra: Extra::new(),
        },
    ];

    let mut audio = AudioAsset::new(None);
    audio.sample_rate = Some(16000);
    audio.duration_s = Some(DURATION_S);

    let mut debug = DebugPayload::default();
    debug.extra.insert("mock".to_string(), json!(true));
    debug.extra.insert("duration_s".to_string(), json!(DURATION_S));

    ExplainableReport {
        schema_version: SCHEMA_VERSION.to_string(),
        ir_version: IR_VERSION.to_string(),
        created_at: now_rfc3339(),
        scores: Scores {
            overall: Some(74),
            content: Some(70),
            fluency: Some(78),
            ..Default::default()
        },
        explanations,
        timeline_layers: TimelineLayers {
            word_regions,
            pause_regions,
            ..Default::default()
        },
        uncertainty_flags: UncertaintyFlags::default(),
        audio: Some(audio),
        debug,
        extra: Extra::new(),
    }
}
