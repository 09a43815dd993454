//! [`VoiceprintModel`] baseline built from filterbank statistics.

use crate::error::VoiceprintError;
use crate::fbank::{Fbank, FbankConfig, l2_normalize};
use crate::model::VoiceprintModel;

/// Configuration for [`StatsModel`].
#[derive(Debug, Clone)]
pub struct StatsModelConfig {
    /// Filterbank configuration.
    pub fbank: FbankConfig,
    /// Frames whose mean log energy is more than this many nats below the
    /// loudest frame are ignored. Zero or negative disables gating.
    pub energy_gate: f32,
    /// Decision threshold reported by [`VoiceprintModel::default_threshold`].
    pub threshold: f32,
}

impl Default for StatsModelConfig {
    fn default() -> Self {
        Self {
            fbank: FbankConfig::default(),
            energy_gate: 8.0,
            threshold: 0.85,
        }
    }
}

/// Speaker embedding from log mel filterbank statistics pooling.
///
/// # Pipeline
///
/// 1. PCM16 -> [`Fbank`] -> `[T][num_mels]` log mel energies
/// 2. Drop frames below the energy gate (pauses, room noise)
/// 3. Per-bin mean (spectral envelope, centred across bins) and
///    per-bin standard deviation (temporal dynamics)
/// 4. Concatenate and L2-normalize -> `2 * num_mels` dimensions
///
/// No learned weights, so it needs nothing on disk. Pure silence has no
/// envelope and yields the zero vector, which scores 0 against anything.
pub struct StatsModel {
    fbank: Fbank,
    energy_gate: f32,
    threshold: f32,
}

impl StatsModel {
    pub fn new(cfg: StatsModelConfig) -> Result<Self, VoiceprintError> {
        if !(-1.0..=1.0).contains(&cfg.threshold) {
            return Err(VoiceprintError::Config(format!(
                "stats: threshold {} outside [-1, 1]",
                cfg.threshold
            )));
        }
        Ok(Self {
            fbank: Fbank::new(cfg.fbank)?,
            energy_gate: cfg.energy_gate,
            threshold: cfg.threshold,
        })
    }

    fn voiced_frames<'a>(&self, features: &'a [Vec<f32>]) -> Vec<&'a [f32]> {
        if self.energy_gate <= 0.0 {
            return features.iter().map(Vec::as_slice).collect();
        }

        let energies: Vec<f32> = features
            .iter()
            .map(|f| f.iter().sum::<f32>() / f.len() as f32)
            .collect();
        let loudest = energies.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        features
            .iter()
            .zip(&energies)
            .filter(|&(_, &e)| e >= loudest - self.energy_gate)
            .map(|(f, _)| f.as_slice())
            .collect()
    }
}

impl Default for StatsModel {
    fn default() -> Self {
        Self {
            fbank: Fbank::new(FbankConfig::default()).expect("default fbank config is valid"),
            energy_gate: 8.0,
            threshold: 0.85,
        }
    }
}

impl VoiceprintModel for StatsModel {
    fn extract(&self, pcm: &[i16]) -> Result<Vec<f32>, VoiceprintError> {
        let features = self
            .fbank
            .compute(pcm)
            .ok_or(VoiceprintError::AudioTooShort {
                min_samples: self.fbank.min_samples(),
                got_samples: pcm.len(),
            })?;

        // The loudest frame always passes the gate, so this is never empty.
        let frames = self.voiced_frames(&features);
        let num_mels = self.fbank.num_mels();
        let t = frames.len() as f64;

        let mut mean = vec![0.0f64; num_mels];
        for frame in &frames {
            for (acc, &v) in mean.iter_mut().zip(frame.iter()) {
                *acc += v as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= t);

        let mut std = vec![0.0f64; num_mels];
        for frame in &frames {
            for ((acc, &v), &m) in std.iter_mut().zip(frame.iter()).zip(&mean) {
                let d = v as f64 - m;
                *acc += d * d;
            }
        }
        std.iter_mut().for_each(|s| *s = (*s / t).sqrt());

        let level = mean.iter().sum::<f64>() / num_mels as f64;
        let mut embedding: Vec<f32> = mean
            .iter()
            .map(|m| (m - level) as f32)
            .chain(std.iter().map(|&s| s as f32))
            .collect();
        l2_normalize(&mut embedding);

        tracing::trace!(frames = features.len(), voiced = frames.len(), "stats embedding");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        2 * self.fbank.num_mels()
    }

    fn name(&self) -> &str {
        "stats"
    }

    fn default_threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;
    use std::f64::consts::PI;

    /// Harmonic buzz at `f0` with a 4Hz syllable-like envelope.
    fn voice_like(f0: f64, n: usize) -> Vec<i16> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 16000.0;
                let env = 0.6 + 0.4 * (2.0 * PI * 4.0 * t).sin();
                let s: f64 = (1..=8)
                    .map(|h| (2.0 * PI * f0 * h as f64 * t).sin() / h as f64)
                    .sum();
                (s * env * 6000.0) as i16
            })
            .collect()
    }

    #[test]
    fn dimension_and_unit_norm() {
        let model = StatsModel::default();
        assert_eq!(model.dimension(), 160);
        assert_eq!(model.name(), "stats");

        let emb = model.extract(&voice_like(120.0, 16000)).unwrap();
        assert_eq!(emb.len(), 160);
        let norm: f64 = emb.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm {norm}");
    }

    #[test]
    fn deterministic() {
        let model = StatsModel::default();
        let pcm = voice_like(180.0, 24000);
        assert_eq!(model.extract(&pcm).unwrap(), model.extract(&pcm).unwrap());
    }

    #[test]
    fn same_audio_scores_one() {
        let model = StatsModel::default();
        let pcm = voice_like(150.0, 32000);
        let a = model.extract(&pcm).unwrap();
        let b = model.extract(&pcm).unwrap();
        let score = cosine_similarity(&a, &b).unwrap();
        assert!(score > 0.9999, "score {score}");
        assert!(score >= model.default_threshold());
    }

    #[test]
    fn different_signals_score_lower() {
        let model = StatsModel::default();
        let low = model.extract(&voice_like(110.0, 32000)).unwrap();
        let high = model.extract(&voice_like(900.0, 32000)).unwrap();
        let score = cosine_similarity(&low, &high).unwrap();
        assert!(score < 0.999, "score {score}");
    }

    #[test]
    fn silence_is_zero_vector() {
        let model = StatsModel::default();
        let emb = model.extract(&vec![0i16; 8000]).unwrap();
        assert!(emb.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn too_short() {
        let model = StatsModel::default();
        let err = model.extract(&[0i16; 100]).unwrap_err();
        assert!(matches!(
            err,
            VoiceprintError::AudioTooShort {
                min_samples: 400,
                got_samples: 100
            }
        ));
    }

    #[test]
    fn bad_threshold_rejected() {
        let cfg = StatsModelConfig {
            threshold: 1.5,
            ..StatsModelConfig::default()
        };
        assert!(StatsModel::new(cfg).is_err());
    }

    #[test]
    fn gate_disabled_keeps_all_frames() {
        let model = StatsModel::new(StatsModelConfig {
            energy_gate: 0.0,
            ..StatsModelConfig::default()
        })
        .unwrap();
        let features = vec![vec![0.0f32; 80], vec![-50.0f32; 80]];
        assert_eq!(model.voiced_frames(&features).len(), 2);
        assert_eq!(StatsModel::default().voiced_frames(&features).len(), 1);
    }
}
