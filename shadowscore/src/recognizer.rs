//! Replay recognizer backed by recorded host responses.
//!
//! Responses use the host service envelope:
//!
//! ```json
//! { "code": 200, "message": "ok",
//!   "data": { "text": "...", "language": "en", "duration": 2.4,
//!             "segments": [ { "id": 0, "start": 0.0, "end": 2.4, "text": "...",
//!                             "avg_logprob": -0.2, "no_speech_prob": 0.01,
//!                             "words": [ { "word": " I", "start": 0.1, "end": 0.3,
//!                                          "probability": 0.98 } ] } ] } }
//! ```
//!
//! Each `transcribe` call consumes the next recorded response; once the script
//! runs out the last response is served again.

use crate::error::RecognitionError;
use crate::traits::SpeechRecognizer;
use crate::types::{
    Extra, RecognitionParams, RecognitionResult, RecognitionSegment, RecognitionWord,
};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

const SUCCESS_CODE: i64 = 200;
const DEFAULT_FAILURE_MESSAGE: &str = "asr failed";

/// One recorded recognizer outcome.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedResponse {
    Success(RecognitionResult),
    Failure {
        message: String,
        code: Option<String>,
    },
}

impl From<RecognitionResult> for RecordedResponse {
    fn from(result: RecognitionResult) -> Self {
        Self::Success(result)
    }
}

impl RecordedResponse {
    /// Convert a host envelope into a recorded outcome.
    pub fn from_envelope(envelope: &Value) -> Self {
        let code = envelope.get("code").and_then(Value::as_i64);
        if code != Some(SUCCESS_CODE) {
            let message = envelope
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                .to_string();
            let code = envelope
                .get("data")
                .and_then(|d| d.get("error_code"))
                .and_then(|c| match c {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
            return Self::Failure { message, code };
        }

        let empty = serde_json::Map::new();
        let data = envelope
            .get("data")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        Self::Success(result_from_data(data))
    }
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn f64_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn word_from_value(value: &Value) -> Option<RecognitionWord> {
    let obj = value.as_object()?;
    let word = str_field(obj, "word");
    if word.is_empty() {
        return None;
    }
    Some(RecognitionWord {
        word,
        start_s: f64_field(obj, "start"),
        end_s: f64_field(obj, "end"),
        probability: f64_field(obj, "probability"),
        extra: Extra::new(),
    })
}

fn segment_from_value(value: &Value) -> Option<RecognitionSegment> {
    let obj = value.as_object()?;
    let words = obj
        .get("words")
        .and_then(Value::as_array)
        .map(|ws| ws.iter().filter_map(word_from_value).collect())
        .unwrap_or_default();
    Some(RecognitionSegment {
        id: obj.get("id").and_then(Value::as_i64),
        start_s: f64_field(obj, "start"),
        end_s: f64_field(obj, "end"),
        text: str_field(obj, "text"),
        words,
        avg_logprob: f64_field(obj, "avg_logprob"),
        no_speech_prob: f64_field(obj, "no_speech_prob"),
        extra: Extra::new(),
    })
}

fn result_from_data(data: &serde_json::Map<String, Value>) -> RecognitionResult {
    let segments = data
        .get("segments")
        .and_then(Value::as_array)
        .map(|segs| segs.iter().filter_map(segment_from_value).collect())
        .unwrap_or_default();

    let mut extra = Extra::new();
    if let Some(p) = data.get("language_probability").filter(|p| !p.is_null()) {
        extra.insert("language_probability".to_string(), p.clone());
    }

    RecognitionResult {
        text: str_field(data, "text"),
        language: data
            .get("language")
            .and_then(Value::as_str)
            .map(str::to_string),
        segments,
        duration_s: f64_field(data, "duration"),
        model_size: data
            .get("model_size")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        extra,
    }
}

/// Speech recognizer that replays recorded responses in order.
#[derive(Debug)]
pub struct ReplayRecognizer {
    responses: Vec<RecordedResponse>,
    cursor: AtomicUsize,
    calls: Mutex<Vec<RecognitionParams>>,
}

impl ReplayRecognizer {
    pub fn new<I, T>(responses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RecordedResponse>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Parse one envelope or an array of envelopes.
    pub fn from_json_str(json: &str) -> Result<Self, RecognitionError> {
        let value: Value = serde_json::from_str(json)?;
        let responses: Vec<RecordedResponse> = match &value {
            Value::Array(items) => items.iter().map(RecordedResponse::from_envelope).collect(),
            single => vec![RecordedResponse::from_envelope(single)],
        };
        Ok(Self::new(responses))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecognitionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of recorded responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Parameter sets received so far, in call order.
    pub fn calls(&self) -> Vec<RecognitionParams> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SpeechRecognizer for ReplayRecognizer {
    fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, RecognitionError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            audio = ?audio_path.display(),
            language,
            call = index,
            forwarded = ?params.forwarded_names(),
            "replaying recognition"
        );

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(params.clone());

        let response = self
            .responses
            .get(index)
            .or_else(|| self.responses.last())
            .ok_or(RecognitionError::Exhausted)?;

        match response {
            RecordedResponse::Success(result) => Ok(result.clone()),
            RecordedResponse::Failure { message, code } => Err(RecognitionError::Failed {
                message: message.clone(),
                code: code.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn envelope() -> Value {
        json!({
            "code": 200,
            "data": {
                "text": " I want milk ",
                "language": "en",
                "language_probability": 0.97,
                "duration": 2.5,
                "model_size": "small",
                "segments": [
                    {
                        "id": 0, "start": 0.0, "end": 2.4, "text": " I want milk",
                        "avg_logprob": -0.3, "no_speech_prob": 0.02,
                        "words": [
                            {"word": " I", "start": 0.1, "end": 0.3, "probability": 0.9},
                            {"word": "  ", "start": 0.3, "end": 0.4},
                            "garbage",
                            {"word": "want", "start": 0.4, "end": 0.8},
                            {"word": "milk.", "start": 0.9, "end": 1.4}
                        ]
                    },
                    42
                ]
            }
        })
    }

    #[test]
    fn converts_success_envelope() {
        let RecordedResponse::Success(result) = RecordedResponse::from_envelope(&envelope()) else {
            panic!("expected success");
        };
        assert_eq!(result.text, "I want milk");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.duration_s, Some(2.5));
        assert_eq!(result.model_size.as_deref(), Some("small"));
        assert_eq!(result.extra.get("language_probability"), Some(&json!(0.97)));
        assert_eq!(result.segments.len(), 1);

        let words: Vec<&str> = result.words().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["I", "want", "milk."]);
        assert_eq!(result.segments[0].avg_logprob, Some(-0.3));
    }

    #[test]
    fn converts_failure_envelope_with_error_code() {
        let response = RecordedResponse::from_envelope(&json!({
            "code": 500,
            "message": "model not loaded",
            "data": {"error_code": "MODEL_MISSING"}
        }));
        assert_eq!(
            response,
            RecordedResponse::Failure {
                message: "model not loaded".to_string(),
                code: Some("MODEL_MISSING".to_string()),
            }
        );
    }

    #[test]
    fn failure_without_message_uses_default() {
        let response = RecordedResponse::from_envelope(&json!({"code": 503}));
        assert_eq!(
            response,
            RecordedResponse::Failure {
                message: DEFAULT_FAILURE_MESSAGE.to_string(),
                code: None,
            }
        );
    }

    #[test]
    fn replays_in_order_then_repeats_last() {
        let first = RecognitionResult {
            text: "first".to_string(),
            ..Default::default()
        };
        let second = RecognitionResult {
            text: "second".to_string(),
            ..Default::default()
        };
        let recognizer = ReplayRecognizer::new([first, second]);
        let params = RecognitionParams::default();
        let path = Path::new("take.wav");

        let texts: Vec<String> = (0..3)
            .map(|_| recognizer.transcribe(path, None, &params).unwrap().text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "second"]);
        assert_eq!(recognizer.calls().len(), 3);
    }

    #[test]
    fn empty_script_is_a_failure() {
        let recognizer = ReplayRecognizer::new(Vec::<RecordedResponse>::new());
        let err = recognizer
            .transcribe(Path::new("take.wav"), None, &RecognitionParams::default())
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Exhausted));
    }

    #[test]
    fn recorded_failure_is_returned_as_error() {
        let recognizer = ReplayRecognizer::from_json_str(
            r#"[{"code": 500, "message": "boom", "data": {"error_code": "E1"}}]"#,
        )
        .unwrap();
        let err = recognizer
            .transcribe(Path::new("take.wav"), Some("en"), &RecognitionParams::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "boom (E1)");
    }

    #[test]
    fn loads_single_envelope_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.json");
        std::fs::write(&path, envelope().to_string()).unwrap();

        let recognizer = ReplayRecognizer::from_file(&path).unwrap();
        assert_eq!(recognizer.len(), 1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = ReplayRecognizer::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RecognitionError::Json(_)));
    }
}
