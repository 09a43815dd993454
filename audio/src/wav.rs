//! WAV container decoding and encoding.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::AudioError;
use crate::format::Format;
use crate::pcm::{Pcm, downmix};

/// A decoded WAV file: interleaved float samples plus their source format.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub format: Format,
    /// Interleaved samples scaled to `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl Decoded {
    /// Averages all channels into one.
    pub fn into_mono(self) -> Vec<f32> {
        downmix(&self.samples, self.format.channels as usize)
    }
}

/// Decodes a WAV byte buffer of any PCM integer or float layout.
pub fn decode(data: &[u8]) -> Result<Decoded, AudioError> {
    if data.is_empty() {
        return Err(AudioError::Empty);
    }

    let mut reader = WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();
    let format = Format::new(spec.sample_rate, spec.channels);
    format.check()?;

    let samples = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(AudioError::Unsupported(format!(
                    "{}-bit float",
                    spec.bits_per_sample
                )));
            }
            reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
        }
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Unsupported(format!(
                    "{}-bit integer",
                    spec.bits_per_sample
                )));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    tracing::debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        samples = samples.len(),
        "decoded wav"
    );

    Ok(Decoded { format, samples })
}

/// Encodes mono PCM16 as a WAV file.
pub fn encode(pcm: &Pcm) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: pcm.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buf = Vec::with_capacity(44 + pcm.len() * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buf), spec)?;
        for &s in pcm.samples() {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(buf)
}
