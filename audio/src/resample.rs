//! Whole-buffer sample rate conversion with rubato.

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;
use crate::format::SUPPORTED_SAMPLE_RATES;

/// Frames per resampler processing block.
const CHUNK_FRAMES: usize = 1024;

/// Resamples mono float audio from `from` Hz to `to` Hz.
///
/// The output is aligned with the input (the resampler delay is trimmed)
/// and holds `ceil(len * to / from)` samples.
pub fn resample(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    if !SUPPORTED_SAMPLE_RATES.contains(&from) || !SUPPORTED_SAMPLE_RATES.contains(&to) {
        return Err(AudioError::Unsupported(format!(
            "sample rate {from} -> {to}"
        )));
    }
    if from == to || input.is_empty() {
        return Ok(input.to_vec());
    }

    let mut resampler = FftFixedInOut::<f32>::new(from as usize, to as usize, CHUNK_FRAMES, 1)?;
    let delay = resampler.output_delay();
    let expected = (input.len() as u64 * to as u64).div_ceil(from as u64) as usize;

    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);
    let mut chunk: Vec<f32> = Vec::with_capacity(resampler.input_frames_max());
    let mut pos = 0;

    // Keep feeding (zero-padded past the end) until the delayed tail is flushed.
    while output.len() < expected + delay {
        let need = resampler.input_frames_next();
        let end = (pos + need).min(input.len());
        chunk.clear();
        chunk.extend_from_slice(&input[pos..end]);
        chunk.resize(need, 0.0);
        pos = end;

        let processed = resampler.process(std::slice::from_ref(&chunk), None)?;
        output.extend_from_slice(&processed[0]);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, rate: u32, secs: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn same_rate_passthrough() {
        let input = sine(440.0, 16000, 0.1);
        assert_eq!(resample(&input, 16000, 16000).unwrap(), input);
    }

    #[test]
    fn downsample_48k_length() {
        let input = sine(440.0, 48000, 1.0);
        let out = resample(&input, 48000, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn downsample_44k_length() {
        let input = sine(440.0, 44100, 0.5);
        let out = resample(&input, 44100, 16000).unwrap();
        assert_eq!(out.len(), 8000);
    }

    #[test]
    fn upsample_8k_length() {
        let input = sine(300.0, 8000, 0.25);
        let out = resample(&input, 8000, 16000).unwrap();
        assert_eq!(out.len(), 4000);
    }

    #[test]
    fn energy_preserved_in_band() {
        let input = sine(440.0, 48000, 1.0);
        let out = resample(&input, 48000, 16000).unwrap();
        // Skip edges where the filter rings.
        let mid = &out[2000..14000];
        let ratio = rms(mid) / rms(&input);
        assert!((ratio - 1.0).abs() < 0.1, "rms ratio {ratio}");
    }

    #[test]
    fn unsupported_rates_rejected() {
        assert!(resample(&[0.0; 10], 0, 16000).is_err());
        assert!(matches!(
            resample(&[0.0; 10], 2_147_483_647, 16000),
            Err(AudioError::Unsupported(_))
        ));
    }

    #[test]
    fn empty_input() {
        assert!(resample(&[], 48000, 16000).unwrap().is_empty());
    }
}
