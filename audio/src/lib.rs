//! Audio decoding and normalization for voice samples.
//!
//! Browsers and recorders hand us WAV files at whatever rate and channel
//! count the capture device used. Speaker embedding models want 16kHz mono
//! PCM16, so every sample goes through [`normalize`] first:
//!
//! 1. [`wav::decode`]: WAV bytes -> interleaved float samples
//! 2. downmix to mono by averaging channels
//! 3. [`resample::resample`]: source rate -> [`MODEL_SAMPLE_RATE`]
//!
//! # Example
//!
//! ```no_run
//! use voicegate_audio::{normalize, MODEL_SAMPLE_RATE};
//!
//! let bytes = std::fs::read("enroll.wav").unwrap();
//! let pcm = normalize(&bytes, MODEL_SAMPLE_RATE).unwrap();
//! assert_eq!(pcm.sample_rate(), 16000);
//! ```

mod error;
pub mod format;
mod pcm;
pub mod resample;
pub mod wav;

pub use error::AudioError;
pub use format::{Format, MODEL_SAMPLE_RATE, SUPPORTED_SAMPLE_RATES};
pub use pcm::Pcm;

/// Decodes WAV bytes into mono PCM16 at `target_rate`.
pub fn normalize(data: &[u8], target_rate: u32) -> Result<Pcm, AudioError> {
    let decoded = wav::decode(data)?;
    let source_rate = decoded.format.sample_rate;
    let mono = decoded.into_mono();
    if mono.is_empty() {
        return Err(AudioError::Empty);
    }

    let samples = resample::resample(&mono, source_rate, target_rate)?;
    Ok(Pcm::from_f32(target_rate, &samples))
}
