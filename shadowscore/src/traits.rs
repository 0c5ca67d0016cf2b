//! Capability traits at the pipeline's I/O boundary.

use crate::error::RecognitionError;
use crate::types::{RecognitionParams, RecognitionResult};
use std::path::Path;

/// Speech recognition capability consumed by the scoring pipeline.
///
/// This is the only I/O the pipeline performs. Implementations must return
/// `Err` when the call fails and `Ok` with an empty result when the call
/// succeeded but heard nothing: only a successful attempt can trigger
/// escalation to another parameter set.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one recording with word timestamps.
    fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, RecognitionError>;
}

impl<R: SpeechRecognizer + ?Sized> SpeechRecognizer for &R {
    fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, RecognitionError> {
        (**self).transcribe(audio_path, language, params)
    }
}

impl<R: SpeechRecognizer + ?Sized> SpeechRecognizer for Box<R> {
    fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, RecognitionError> {
        (**self).transcribe(audio_path, language, params)
    }
}
