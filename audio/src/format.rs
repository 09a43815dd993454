//! Audio format descriptors.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::AudioError;

/// Sample rate expected by the speaker embedding models.
pub const MODEL_SAMPLE_RATE: u32 = 16000;

/// Source sample rates accepted from WAV headers.
///
/// Resampler setup cost grows with the ratio between the two rates, so
/// headers outside this band are refused before any buffers are built.
pub const SUPPORTED_SAMPLE_RATES: RangeInclusive<u32> = 8000..=192_000;

/// Describes interleaved PCM audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz (e.g., 16000, 44100, 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Format {
    /// Creates a mono format with the given sample rate.
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Creates a format with an explicit channel count.
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Rejects formats the normalization pipeline cannot handle.
    pub fn check(&self) -> Result<(), AudioError> {
        if self.channels == 0 {
            return Err(AudioError::Unsupported("zero channels".into()));
        }
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(AudioError::Unsupported(format!(
                "sample rate {} Hz outside {}..={} Hz",
                self.sample_rate,
                SUPPORTED_SAMPLE_RATES.start(),
                SUPPORTED_SAMPLE_RATES.end()
            )));
        }
        Ok(())
    }

    /// Playback duration of `frames` sample frames.
    pub fn duration_of_frames(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(frames as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}
