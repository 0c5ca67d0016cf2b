//! shadowscore: Explainable scoring for speech-shadowing practice.
//!
//! Given a recording of a learner reading a target sentence, this crate
//! produces a versioned, word-level diagnostic report (what was said right,
//! dropped, substituted or added, with timing and severity) and a 0–100
//! content score.
//!
//! # Architecture
//!
//! Speech recognition is the only I/O and is consumed through one trait:
//!
//! - [`traits::SpeechRecognizer`]: Transcribes a recording with word timestamps
//!
//! Everything else is pure and synchronous:
//!
//! - [`attempt`]: One recognizer call aligned ([`align`]), suffix-reconciled
//!   ([`morphology`]), timed ([`timing`]) and scored ([`scorer`])
//! - [`pipelines::ScoringPipeline`]: Escalates neutral → biased → robust
//!   attempts and [`selection`] picks one
//! - [`report`]: Builds timeline regions, explanations and the debug payload
//!
//! # Quick Start
//!
//! ```ignore
//! use shadowscore::config::ScoringContext;
//! use shadowscore::pipelines::ScoringPipeline;
//! use shadowscore::recognizer::ReplayRecognizer;
//!
//! // Replay a recorded recognizer response
//! let recognizer = ReplayRecognizer::from_file("take.json")?;
//!
//! // Score the recording against its target sentence
//! let pipeline = ScoringPipeline::new(recognizer);
//! let context = ScoringContext::default().with_course_title("Grocery shopping");
//! let report = pipeline.score("take.wav", "I want to buy milk", Some("en"), &context)?;
//! println!("{}", report.to_json_pretty()?);
//! ```

pub mod align;
pub mod attempt;
pub mod audio;
pub mod config;
pub mod error;
pub mod hints;
pub mod morphology;
pub mod normalize;
pub mod pipelines;
pub mod recognizer;
pub mod report;
pub mod scorer;
pub mod selection;
pub mod timing;
pub mod traits;
pub mod types;
pub mod versions;
