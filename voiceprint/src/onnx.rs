//! [`VoiceprintModel`] implementation running an ONNX speaker network.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

use crate::error::VoiceprintError;
use crate::fbank::{Fbank, FbankConfig, cmvn, l2_normalize};
use crate::model::VoiceprintModel;
use crate::segment::segment_starts;
use crate::similarity::average;

/// Number of fbank frames per inference segment.
/// 300 frames = 3 seconds at 10ms hop.
const SEG_FRAMES: usize = 300;

/// Hop between segments for averaging.
const HOP_FRAMES: usize = 150;

/// Configuration for [`OnnxModel`].
#[derive(Debug, Clone)]
pub struct OnnxModelConfig {
    /// Expected embedding dimension (default: 512).
    pub dim: usize,
    /// Filterbank configuration.
    pub fbank: FbankConfig,
    /// Input tensor name, shaped `[1, T, num_mels]` (default: "x").
    pub input_name: String,
    /// Output tensor name, shaped `[1, dim]` (default: "embedding").
    pub output_name: String,
    /// Decision threshold (default: 0.5).
    pub threshold: f32,
    /// Intra-op threads for the runtime (default: 2).
    pub intra_threads: usize,
}

impl Default for OnnxModelConfig {
    fn default() -> Self {
        Self {
            dim: 512,
            fbank: FbankConfig::default(),
            input_name: "x".to_string(),
            output_name: "embedding".to_string(),
            threshold: 0.5,
            intra_threads: 2,
        }
    }
}

/// Speaker embedding network (ERes2Net / ECAPA-TDNN exports) executed with
/// ONNX Runtime.
///
/// # Pipeline
///
/// 1. PCM16 -> [`Fbank`] -> [`cmvn`]
/// 2. 300-frame windows with a 150-frame hop (a single window for short audio)
/// 3. Average the L2-normalized window embeddings, normalize again
///
/// The session is loaded once; runs are serialized through a mutex.
pub struct OnnxModel {
    session: Mutex<Session>,
    fbank: Fbank,
    cfg: OnnxModelConfig,
}

fn model_err(e: impl std::fmt::Display) -> VoiceprintError {
    VoiceprintError::Model(e.to_string())
}

impl OnnxModel {
    /// Loads an ONNX model from disk.
    pub fn from_file(
        path: impl AsRef<Path>,
        cfg: OnnxModelConfig,
    ) -> Result<Self, VoiceprintError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading onnx speaker model");

        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(cfg.intra_threads)
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(model_err)?;

        Ok(Self {
            session: Mutex::new(session),
            fbank: Fbank::new(cfg.fbank.clone())?,
            cfg,
        })
    }

    fn run_segment(&self, features: &[Vec<f32>]) -> Result<Vec<f32>, VoiceprintError> {
        let frames = features.len();
        let mels = self.fbank.num_mels();
        let flat: Vec<f32> = features.iter().flatten().copied().collect();
        let input = Tensor::from_array(([1usize, frames, mels], flat)).map_err(model_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VoiceprintError::Model("session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.cfg.input_name.as_str() => input])
            .map_err(model_err)?;
        let (_, data) = outputs[self.cfg.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(model_err)?;

        if data.len() < self.cfg.dim {
            return Err(VoiceprintError::DimensionMismatch {
                expected: self.cfg.dim,
                got: data.len(),
            });
        }
        let mut emb = data[..self.cfg.dim].to_vec();
        l2_normalize(&mut emb);
        Ok(emb)
    }
}

impl VoiceprintModel for OnnxModel {
    fn extract(&self, pcm: &[i16]) -> Result<Vec<f32>, VoiceprintError> {
        let mut features = self
            .fbank
            .compute(pcm)
            .ok_or(VoiceprintError::AudioTooShort {
                min_samples: self.fbank.min_samples(),
                got_samples: pcm.len(),
            })?;
        cmvn(&mut features);

        let n = features.len();
        let embeddings = segment_starts(n, SEG_FRAMES, HOP_FRAMES)
            .into_iter()
            .map(|s| self.run_segment(&features[s..(s + SEG_FRAMES).min(n)]))
            .collect::<Result<Vec<_>, _>>()?;

        let mut avg = average(&embeddings)
            .ok_or_else(|| VoiceprintError::Model("no segments".into()))?;
        l2_normalize(&mut avg);
        Ok(avg)
    }

    fn dimension(&self) -> usize {
        self.cfg.dim
    }

    fn name(&self) -> &str {
        "onnx"
    }

    fn default_threshold(&self) -> f32 {
        self.cfg.threshold
    }
}
