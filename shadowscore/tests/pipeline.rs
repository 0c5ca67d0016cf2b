//! Integration tests for the scoring pipeline.

use pretty_assertions::assert_eq;
use serde_json::json;
use shadowscore::config::{EscalationConfig, ScoringContext, UncertaintyThresholds};
use shadowscore::error::{Error, RecognitionError};
use shadowscore::pipelines::ScoringPipeline;
use shadowscore::recognizer::{RecordedResponse, ReplayRecognizer};
use shadowscore::selection::OVERRIDE_LOW_CONFIDENCE_PERFECT;
use shadowscore::types::{
    EditType, ExplainableReport, RecognitionResult, RecognitionSegment, RecognitionWord, Severity,
};

const AUDIO: &str = "take.wav";

/// Recognition result with one segment, words timed back to back.
fn heard(words: &[&str], avg_logprob: f64) -> RecognitionResult {
    let words: Vec<RecognitionWord> = words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let start = 0.1 + i as f64 * 0.4;
            RecognitionWord::new(*w, start, start + 0.35)
        })
        .collect();
    RecognitionResult {
        text: words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>().join(" "),
        language: Some("en".to_string()),
        segments: vec![RecognitionSegment {
            id: Some(0),
            words,
            avg_logprob: Some(avg_logprob),
            no_speech_prob: Some(0.01),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn pipeline<I>(responses: I) -> ScoringPipeline<ReplayRecognizer>
where
    I: IntoIterator,
    I::Item: Into<RecordedResponse>,
{
    ScoringPipeline::new(ReplayRecognizer::new(responses))
}

fn edit_types(report: &ExplainableReport) -> Vec<EditType> {
    report
        .debug
        .ir
        .as_ref()
        .map(|ir| ir.diff_edits.iter().map(|e| e.kind).collect())
        .unwrap_or_default()
}

fn beam_sizes(pipeline: &ScoringPipeline<ReplayRecognizer>) -> Vec<Option<u32>> {
    pipeline
        .recognizer()
        .calls()
        .iter()
        .map(|p| p.beam_size)
        .collect()
}

#[test]
fn substituted_and_dropped_words_score_60() {
    let pipeline = pipeline([heard(&["I", "want", "to", "by"], -0.3)]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", Some("en"), &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(60));
    assert_eq!(report.scores.overall, Some(60));
    assert_eq!(report.scores.fluency, None);
    assert_eq!(
        edit_types(&report),
        vec![
            EditType::Match,
            EditType::Match,
            EditType::Match,
            EditType::Substitution,
            EditType::Missing,
        ]
    );

    let kinds: Vec<&str> = report.explanations.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["content.substitution", "content.missing"]);
    assert_eq!(report.explanations[0].severity, Severity::Warning);
    assert_eq!(report.explanations[0].message, "Maybe said \"by\" instead of \"buy\"");
    assert_eq!(report.explanations[1].message, "Maybe missed \"milk\"");

    // "milk" follows the last heard word with a default-length span
    let milk = report.explanations[1].time_span.unwrap();
    assert!((milk.start_s - 1.65).abs() < 1e-9);
    assert!((milk.end_s - 1.77).abs() < 1e-9);
    assert_eq!(report.timeline_layers.word_regions.len(), 5);

    assert_eq!(report.debug.target_words, vec!["i", "want", "to", "buy", "milk"]);
    assert_eq!(report.debug.hyp_words, vec!["i", "want", "to", "by"]);
}

#[test]
fn time_spans_are_non_decreasing_in_edit_order() {
    let pipeline = pipeline([heard(&["I", "to", "buy", "some", "milk"], -0.3)]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", None, &ScoringContext::default())
        .unwrap();

    let ir = report.debug.ir.unwrap();
    let starts: Vec<f64> = ir
        .diff_edits
        .iter()
        .filter_map(|e| e.time_span.map(|s| s.start_s))
        .collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]), "{starts:?}");
}

#[test]
fn dropped_plural_scores_75() {
    let pipeline = pipeline([heard(&["walk"], -0.2)]);
    let report = pipeline
        .score(AUDIO, "walks", None, &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(75));
    assert_eq!(report.explanations.len(), 1);
    assert_eq!(report.explanations[0].message, "Maybe missed suffix (-s)");
    assert_eq!(report.explanations[0].severity, Severity::Info);
}

#[test]
fn accepted_neutral_attempt_stops_escalation() {
    let pipeline = pipeline([heard(&["I", "want", "to", "buy", "milk"], -0.2)]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", Some("en"), &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(100));
    assert_eq!(beam_sizes(&pipeline), vec![Some(5)]);
    assert_eq!(report.debug.asr_attempts.len(), 1);
    assert_eq!(report.debug.asr_chosen.as_deref(), Some("neutral"));
}

#[test]
fn poor_attempts_escalate_through_biased_and_robust() {
    let pipeline = pipeline([heard(&["I", "want", "to", "by"], -0.3)]);
    let context = ScoringContext::default()
        .with_course_title("Grocery shopping")
        .with_model_size("small");
    pipeline
        .score(AUDIO, "I want to buy milk", Some("en"), &context)
        .unwrap();

    let calls = pipeline.recognizer().calls();
    assert_eq!(beam_sizes(&pipeline), vec![Some(5), Some(10), Some(15)]);

    assert_eq!(calls[0].hotwords, None);
    assert_eq!(calls[0].condition_on_previous_text, Some(true));
    assert_eq!(calls[0].temperature, Some(0.0));
    assert_eq!(calls[0].model_size.as_deref(), Some("small"));

    assert_eq!(calls[1].hotwords.as_deref(), Some("grocery shopping want milk"));
    assert_eq!(
        calls[1].initial_prompt.as_deref(),
        Some("English shadowing exercise. Topic: Grocery shopping.")
    );
    assert_eq!(calls[1].condition_on_previous_text, Some(true));

    assert_eq!(calls[2].hotwords, calls[1].hotwords);
    assert_eq!(calls[2].condition_on_previous_text, Some(false));
    assert_eq!(calls[2].model_size.as_deref(), Some("small"));
}

#[test]
fn good_biased_attempt_skips_robust() {
    let pipeline = pipeline([
        heard(&["I", "want", "to", "by"], -0.3),
        heard(&["I", "want", "to", "buy", "milk"], -0.2),
    ]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", Some("en"), &ScoringContext::default())
        .unwrap();

    assert_eq!(beam_sizes(&pipeline), vec![Some(5), Some(10)]);
    assert_eq!(report.debug.asr_chosen.as_deref(), Some("biased"));
    assert_eq!(report.scores.content, Some(100));
    let names: Vec<&str> = report
        .debug
        .asr_attempts
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["neutral", "biased"]);
}

#[test]
fn no_derivable_hints_means_no_escalation() {
    let pipeline = pipeline([heard(&["I", "am"], -0.3)]);
    let report = pipeline
        .score(AUDIO, "I am at the bus", None, &ScoringContext::default())
        .unwrap();

    assert!(report.scores.content.unwrap() < 98);
    assert_eq!(beam_sizes(&pipeline), vec![Some(5)]);
}

#[test]
fn title_alone_makes_hints_derivable() {
    let pipeline = pipeline([heard(&["I"], -0.3)]);
    let context = ScoringContext::default().with_course_title("Bus");
    pipeline.score(AUDIO, "I go", None, &context).unwrap();

    let calls = pipeline.recognizer().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].hotwords, None);
    assert_eq!(
        calls[1].initial_prompt.as_deref(),
        Some("English shadowing exercise. Topic: Bus.")
    );
}

#[test]
fn uncertain_perfect_attempt_yields_to_close_confident_one() {
    // 25 words with one dropped plural: round(100 * (1 - 0.25 / 25)) = 99
    let mut target: Vec<String> = (1..=24).map(|i| format!("word{i:02}")).collect();
    target.insert(0, "walks".to_string());
    let target_text = target.join(" ");

    let mut near: Vec<&str> = target.iter().map(String::as_str).collect();
    near[0] = "walk";
    let exact: Vec<&str> = target.iter().map(String::as_str).collect();

    let escalation = EscalationConfig {
        accept_threshold: 100,
        ..Default::default()
    };
    let pipeline = ScoringPipeline::with_config(
        ReplayRecognizer::new([heard(&near, -0.2), heard(&exact, -2.0)]),
        escalation,
        UncertaintyThresholds::default(),
    )
    .unwrap();

    let report = pipeline
        .score(AUDIO, &target_text, Some("en"), &ScoringContext::default())
        .unwrap();

    assert_eq!(report.debug.asr_attempts.len(), 2);
    assert_eq!(report.debug.asr_attempts[1].content, 100);
    assert!(report.debug.asr_attempts[1].low_confidence);

    assert_eq!(report.debug.asr_chosen.as_deref(), Some("neutral"));
    assert_eq!(report.scores.content, Some(99));
    assert!(!report.uncertainty_flags.low_confidence);

    let reason = report.debug.asr_choose_reason.unwrap();
    assert_eq!(reason.override_reason.as_deref(), Some(OVERRIDE_LOW_CONFIDENCE_PERFECT));
    assert_eq!(reason.alt_name.as_deref(), Some("neutral"));
    assert_eq!(reason.alt_content, Some(99));
}

#[test]
fn uncertain_perfect_attempt_alone_is_kept_and_flagged() {
    let pipeline = pipeline([heard(&["hello"], -2.0)]);
    let report = pipeline
        .score(AUDIO, "hello", None, &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(100));
    assert!(report.uncertainty_flags.low_confidence);
    assert_eq!(report.uncertainty_flags.notes, vec!["avg_logprob_low"]);
    assert_eq!(report.debug.asr_choose_reason.unwrap().override_reason, None);
}

#[test]
fn recognizer_failure_propagates_unchanged() {
    let recognizer = ReplayRecognizer::from_json_str(
        r#"{"code": 503, "message": "asr busy", "data": {"error_code": "BUSY"}}"#,
    )
    .unwrap();
    let pipeline = ScoringPipeline::new(recognizer);
    let err = pipeline
        .score(AUDIO, "I want to buy milk", None, &ScoringContext::default())
        .unwrap_err();

    match err {
        Error::Recognition(RecognitionError::Failed { message, code }) => {
            assert_eq!(message, "asr busy");
            assert_eq!(code.as_deref(), Some("BUSY"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failure_during_escalation_aborts_the_call() {
    let pipeline = pipeline([
        RecordedResponse::from(heard(&["I"], -0.3)),
        RecordedResponse::Failure {
            message: "timeout".to_string(),
            code: None,
        },
    ]);
    let err = pipeline
        .score(AUDIO, "I want to buy milk", None, &ScoringContext::default())
        .unwrap_err();

    assert!(matches!(err, Error::Recognition(RecognitionError::Failed { .. })));
    assert_eq!(pipeline.recognizer().calls().len(), 2);
}

#[test]
fn empty_target_scores_zero_without_escalating() {
    let pipeline = pipeline([heard(&["hello", "there"], -0.3)]);
    let report = pipeline
        .score(AUDIO, "  ...  ", None, &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(0));
    assert_eq!(edit_types(&report), vec![EditType::Insertion, EditType::Insertion]);
    assert_eq!(pipeline.recognizer().calls().len(), 1);
}

#[test]
fn silence_leaves_every_target_word_missing_and_untimed() {
    let pipeline = pipeline([RecognitionResult::default()]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", None, &ScoringContext::default())
        .unwrap();

    assert_eq!(report.scores.content, Some(0));
    assert_eq!(edit_types(&report), vec![EditType::Missing; 5]);
    assert!(report.timeline_layers.word_regions.is_empty());
    assert!(report.explanations.iter().all(|e| e.time_span.is_none()));
    assert_eq!(pipeline.recognizer().calls().len(), 3);
}

#[test]
fn chinese_language_localizes_explanations() {
    let pipeline = pipeline([heard(&["I", "want", "to", "by"], -0.3)]);
    let report = pipeline
        .score(AUDIO, "I want to buy milk", Some("zh"), &ScoringContext::default())
        .unwrap();

    assert_eq!(report.explanations[0].message, "可能把 \"buy\" 读成了 \"by\"");
    assert_eq!(report.explanations[1].message, "可能漏读了 \"milk\"");
}

#[test]
fn audio_asset_uses_recognizer_duration_then_wav_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("take.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..32000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let probed = pipeline([heard(&["hello"], -0.2)])
        .score(&path, "hello", None, &ScoringContext::default())
        .unwrap();
    let audio = probed.audio.unwrap();
    assert_eq!(audio.sample_rate, Some(16000));
    assert_eq!(audio.duration_s, Some(2.0));

    let mut with_duration = heard(&["hello"], -0.2);
    with_duration.duration_s = Some(1.5);
    let reported = pipeline([with_duration])
        .score(&path, "hello", None, &ScoringContext::default())
        .unwrap();
    assert_eq!(reported.audio.unwrap().duration_s, Some(1.5));
}

#[test]
fn unprobeable_audio_is_not_fatal() {
    let report = pipeline([heard(&["hello"], -0.2)])
        .score("/nonexistent/take.wav", "hello", None, &ScoringContext::default())
        .unwrap();
    let audio = report.audio.unwrap();
    assert_eq!(audio.sample_rate, None);
    assert_eq!(audio.path.as_deref(), Some("/nonexistent/take.wav"));
}

#[test]
fn report_round_trip_preserves_unknown_fields() {
    let report = pipeline([heard(&["I", "want", "to", "by"], -0.3)])
        .score(AUDIO, "I want to buy milk", None, &ScoringContext::default())
        .unwrap();
    assert!(report.is_compatible());

    let mut value = serde_json::to_value(&report).unwrap();
    value["reviewer_note"] = json!("check milk");
    value["scores"]["rhythm"] = json!(81);
    value["timeline_layers"]["word_regions"][0]["color"] = json!("#00ff00");
    value["explanations"][0]["evidence"]["edit"]["phoneme_score"] = json!(0.4);
    value["debug"]["ir"]["diff_edits"][0]["phoneme_score"] = json!(0.9);
    value["debug"]["asr_attempts"][0]["params"]["patience"] = json!(1.5);

    let parsed: ExplainableReport = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(parsed.extra.get("reviewer_note"), Some(&json!("check milk")));
    let edit = parsed.explanations[0].evidence.edit.as_ref().unwrap();
    assert_eq!(edit.extra.get("phoneme_score"), Some(&json!(0.4)));
    assert_eq!(serde_json::to_value(&parsed).unwrap(), value);
}

#[test]
fn suffix_subtokens_keep_unknown_fields() {
    let report = pipeline([heard(&["she", "walk", "home"], -0.2)])
        .score(AUDIO, "she walks home", None, &ScoringContext::default())
        .unwrap();

    let mut value = serde_json::to_value(&report).unwrap();
    let subtokens = &mut value["debug"]["ir"]["diff_edits"][1]["meta"]["subtokens"];
    assert_eq!(subtokens.as_array().map(Vec::len), Some(2));
    subtokens[1]["ipa"] = json!("s");

    let parsed: ExplainableReport = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(serde_json::to_value(&parsed).unwrap(), value);
}

#[test]
fn invalid_config_is_rejected() {
    let escalation = EscalationConfig {
        biased_beam: 0,
        ..Default::default()
    };
    let result = ScoringPipeline::with_config(
        ReplayRecognizer::new(Vec::<RecordedResponse>::new()),
        escalation,
        UncertaintyThresholds::default(),
    );
    assert!(result.is_err());
}
