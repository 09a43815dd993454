//! Mono PCM16 buffers.

use std::time::Duration;

use crate::format::Format;

/// Mono 16-bit PCM audio at a known sample rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcm {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl Pcm {
    /// Wraps mono samples recorded at `sample_rate`.
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Builds a buffer from normalized `[-1, 1]` float samples.
    pub fn from_f32(sample_rate: u32, samples: &[f32]) -> Self {
        let samples = samples
            .iter()
            .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
            .collect();
        Self::new(sample_rate, samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn format(&self) -> Format {
        Format::mono(self.sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration.
    pub fn duration(&self) -> Duration {
        self.format().duration_of_frames(self.samples.len())
    }
}

/// Averages interleaved channels down to one.
pub(crate) fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
