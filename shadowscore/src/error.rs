//! Error types for shadowscore organized by processing stage.

use thiserror::Error;

/// Scoring pipeline error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Speech recognition capability error, passed through unmodified
    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    /// Audio probing error
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Report (de)serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Selection was asked to choose among zero attempts
    #[error("no recognition attempts to select from")]
    NoAttempts,
}

/// Configuration errors (thresholds, beam widths).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Score threshold outside 0..=100
    #[error("invalid {name} threshold: {value} (expected 0..=100)")]
    InvalidThreshold { name: &'static str, value: u8 },

    /// Beam widths must be non-zero and non-decreasing across attempts
    #[error("invalid beam widths: neutral={neutral}, biased={biased}, robust={robust}")]
    InvalidBeamWidths {
        neutral: u32,
        biased: u32,
        robust: u32,
    },

    /// Probability threshold outside 0..=1
    #[error("invalid no-speech probability threshold: {0}")]
    InvalidNoSpeechThreshold(f64),
}

/// Failures reported by a speech recognition capability.
///
/// A capability must return one of these instead of an empty result when the
/// call itself failed; an empty result is a successful transcription of silence.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The recognizer reported a failure status
    #[error("{message}{}", .code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Failed {
        message: String,
        code: Option<String>,
    },

    /// Replay script has no responses
    #[error("no recorded recognition responses")]
    Exhausted,

    /// IO error while reading recorded responses
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed recorded response
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Audio loading and probing errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// IO error during audio loading
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV file format error
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

/// Result type alias for shadowscore operations.
pub type Result<T> = std::result::Result<T, Error>;

// hound::Error → AudioError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Audio(AudioError::Hound(e))
    }
}
