//! WAV header probing.

use crate::error::AudioError;
use hound::WavReader;
use std::path::Path;

/// Format details read from a WAV header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Length in seconds
    pub duration_s: f64,
}

/// Read sample rate, channel count and duration without decoding samples.
///
/// # Errors
///
/// Returns error if the file cannot be opened or is not a valid WAV file.
pub fn probe_wav<P: AsRef<Path>>(path: P) -> Result<WavInfo, AudioError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    // duration() counts frames, one sample per channel
    let frames = reader.duration();

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration_s: if spec.sample_rate == 0 {
            0.0
        } else {
            f64::from(frames) / f64::from(spec.sample_rate)
        },
    })
}
