//! Kaldi-compatible log mel filterbank features.

use std::f64::consts::PI;

use crate::error::VoiceprintError;

/// Configures mel filterbank feature extraction.
///
/// Defaults match the Kaldi front end used to train speaker embedding
/// models: Povey window, 25ms frames, 10ms shift, 80 mel bins, 20-7600 Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct FbankConfig {
    /// Input sample rate in Hz (default: 16000).
    pub sample_rate: usize,
    /// Number of mel filterbank channels (default: 80).
    pub num_mels: usize,
    /// Frame length in samples (default: 400 = 25ms @ 16kHz).
    pub frame_length: usize,
    /// Frame shift in samples (default: 160 = 10ms @ 16kHz).
    pub frame_shift: usize,
    /// Pre-emphasis coefficient (default: 0.97).
    pub pre_emphasis: f64,
    /// Floor for mel energies before the log (default: 1e-10).
    pub energy_floor: f64,
    /// Low cutoff frequency for mel bins (default: 20 Hz).
    pub low_freq: f64,
    /// High cutoff frequency, non-positive = offset from Nyquist (default: -400).
    pub high_freq: f64,
    /// Remove DC offset per frame (default: true).
    pub remove_dc: bool,
    /// Use Povey window (hamming^0.85) instead of Hamming (default: true).
    pub povey_window: bool,
}

impl Default for FbankConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            num_mels: 80,
            frame_length: 400,
            frame_shift: 160,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
            low_freq: 20.0,
            high_freq: -400.0,
            remove_dc: true,
            povey_window: true,
        }
    }
}

/// A triangular mel filter stored as its non-zero span.
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

/// Filterbank extractor with the window, mel filters and FFT size
/// precomputed from a [`FbankConfig`]. Build once, reuse for every call.
#[derive(Debug, Clone)]
pub struct Fbank {
    cfg: FbankConfig,
    fft_size: usize,
    window: Vec<f64>,
    filters: Vec<MelFilter>,
}

impl Fbank {
    pub fn new(cfg: FbankConfig) -> Result<Self, VoiceprintError> {
        if cfg.frame_shift == 0 || cfg.frame_length < 2 || cfg.num_mels == 0 {
            return Err(VoiceprintError::Config(format!(
                "fbank: frame_length={} frame_shift={} num_mels={}",
                cfg.frame_length, cfg.frame_shift, cfg.num_mels
            )));
        }
        if cfg.sample_rate == 0 {
            return Err(VoiceprintError::Config("fbank: zero sample rate".into()));
        }

        let high_freq = if cfg.high_freq <= 0.0 {
            cfg.sample_rate as f64 / 2.0 + cfg.high_freq
        } else {
            cfg.high_freq
        };
        if high_freq <= cfg.low_freq {
            return Err(VoiceprintError::Config(format!(
                "fbank: high_freq {high_freq} <= low_freq {}",
                cfg.low_freq
            )));
        }

        let fft_size = cfg.frame_length.next_power_of_two();
        let window = if cfg.povey_window {
            povey_window(cfg.frame_length)
        } else {
            hamming_window(cfg.frame_length)
        };
        let filters = mel_filters(cfg.num_mels, fft_size, cfg.sample_rate, cfg.low_freq, high_freq);

        Ok(Self {
            cfg,
            fft_size,
            window,
            filters,
        })
    }

    pub fn config(&self) -> &FbankConfig {
        &self.cfg
    }

    pub fn num_mels(&self) -> usize {
        self.cfg.num_mels
    }

    /// Smallest input that yields one frame.
    pub fn min_samples(&self) -> usize {
        self.cfg.frame_length
    }

    /// Number of frames produced for `num_samples` input samples.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples < self.cfg.frame_length {
            return 0;
        }
        (num_samples - self.cfg.frame_length) / self.cfg.frame_shift + 1
    }

    /// Computes `[num_frames][num_mels]` log mel energies from PCM16 samples.
    ///
    /// Returns `None` if the audio is shorter than one frame.
    pub fn compute(&self, pcm: &[i16]) -> Option<Vec<Vec<f32>>> {
        let num_frames = self.num_frames(pcm.len());
        if num_frames == 0 {
            return None;
        }

        let len = self.cfg.frame_length;
        let half_fft = self.fft_size / 2 + 1;
        let mut frame = vec![0.0f64; len];
        let mut spectrum = vec![(0.0f64, 0.0f64); self.fft_size];
        let mut power = vec![0.0f64; half_fft];
        let mut result = Vec::with_capacity(num_frames);

        for f in 0..num_frames {
            let offset = f * self.cfg.frame_shift;
            for (dst, &s) in frame.iter_mut().zip(&pcm[offset..offset + len]) {
                *dst = s as f64 / 32768.0;
            }

            if self.cfg.remove_dc {
                let mean = frame.iter().sum::<f64>() / len as f64;
                frame.iter_mut().for_each(|v| *v -= mean);
            }

            if self.cfg.pre_emphasis > 0.0 {
                for i in (1..len).rev() {
                    frame[i] -= self.cfg.pre_emphasis * frame[i - 1];
                }
                frame[0] *= 1.0 - self.cfg.pre_emphasis;
            }

            spectrum.fill((0.0, 0.0));
            for (i, (&x, &w)) in frame.iter().zip(&self.window).enumerate() {
                spectrum[i].0 = x * w;
            }
            fft(&mut spectrum);

            for (p, &(re, im)) in power.iter_mut().zip(&spectrum[..half_fft]) {
                *p = re * re + im * im;
            }

            let energies = self
                .filters
                .iter()
                .map(|filter| {
                    let energy: f64 = filter
                        .weights
                        .iter()
                        .zip(&power[filter.start..])
                        .map(|(w, p)| w * p)
                        .sum();
                    energy.max(self.cfg.energy_floor).ln() as f32
                })
                .collect();
            result.push(energies);
        }

        Some(result)
    }
}

/// Convenience wrapper building a one-off [`Fbank`].
pub fn compute_fbank(pcm: &[i16], cfg: &FbankConfig) -> Option<Vec<Vec<f32>>> {
    Fbank::new(cfg.clone()).ok()?.compute(pcm)
}

/// CMVN: subtract mean and divide by std per mel bin.
pub fn cmvn(features: &mut [Vec<f32>]) {
    let Some(first) = features.first() else {
        return;
    };
    let num_mels = first.len();
    let t = features.len() as f64;

    for m in 0..num_mels {
        let mean = features.iter().map(|f| f[m] as f64).sum::<f64>() / t;
        let var = features
            .iter()
            .map(|f| {
                let d = f[m] as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / t;
        let std = var.sqrt().max(1e-10);
        for f in features.iter_mut() {
            f[m] = ((f[m] as f64 - mean) / std) as f32;
        }
    }
}

/// L2-normalizes a vector to unit length in-place. Zero vectors are left as is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        v.iter_mut().for_each(|x| *x *= scale);
    }
}

fn hamming_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Povey window (hamming^0.85) used by Kaldi.
fn povey_window(n: usize) -> Vec<f64> {
    hamming_window(n).into_iter().map(|w| w.powf(0.85)).collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Builds triangular filters over `fft_size / 2 + 1` power bins.
fn mel_filters(
    num_mels: usize,
    fft_size: usize,
    sample_rate: usize,
    low_freq: f64,
    high_freq: f64,
) -> Vec<MelFilter> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);
    let step = (mel_high - mel_low) / (num_mels + 1) as f64;

    let bins: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(mel_low + i as f64 * step);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.clamp(0, half_fft as isize - 1) as usize
        })
        .collect();

    bins.windows(3)
        .map(|w| {
            let (left, center, right) = (w[0], w[1], w[2]);
            let mut weights = vec![0.0f64; right - left + 1];
            if center > left {
                for k in left..=center {
                    weights[k - left] = (k - left) as f64 / (center - left) as f64;
                }
            }
            if right > center {
                for k in center..=right {
                    weights[k - left] = (right - k) as f64 / (right - center) as f64;
                }
            }
            MelFilter {
                start: left,
                weights,
            }
        })
        .collect()
}

/// In-place radix-2 Cooley-Tukey FFT over `(re, im)` pairs.
/// The length must be a power of two.
fn fft(x: &mut [(f64, f64)]) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = -2.0 * PI / size as f64;
        let wn = (angle.cos(), angle.sin());
        for start in (0..n).step_by(size) {
            let mut w = (1.0, 0.0);
            for k in 0..half {
                let a = x[start + k];
                let b = x[start + k + half];
                let t = (w.0 * b.0 - w.1 * b.1, w.0 * b.1 + w.1 * b.0);
                x[start + k] = (a.0 + t.0, a.1 + t.1);
                x[start + k + half] = (a.0 - t.0, a.1 - t.1);
                w = (w.0 * wn.0 - w.1 * wn.1, w.0 * wn.1 + w.1 * wn.0);
            }
        }
        size <<= 1;
    }
}
