//! Speaker embeddings and same-speaker scoring.
//!
//! # Architecture
//!
//! 1. [`Fbank`]: PCM16 16kHz mono audio -> log mel filterbank frames
//! 2. [`VoiceprintModel::extract`]: frames -> L2-normalized embedding
//! 3. [`cosine_similarity`]: two embeddings -> score in `[-1, 1]`
//!
//! A model is expensive to build (the ONNX backend loads network weights),
//! so callers construct one at startup and share it as
//! `Arc<dyn VoiceprintModel>`.
//!
//! # Backends
//!
//! - [`StatsModel`]: filterbank statistics pooling, no weights needed
//! - `OnnxModel` (feature `onnx`): a pretrained speaker network run with
//!   ONNX Runtime
//!
//! # Feature Extraction
//!
//! The [`fbank`] module provides Kaldi-compatible log mel filterbank extraction:
//! - Povey window (hamming^0.85)
//! - Pre-emphasis 0.97
//! - Cooley-Tukey FFT
//! - Mel triangular filterbank
//! - CMVN normalization

mod error;
pub mod fbank;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod segment;
mod similarity;
mod stats;

pub use error::VoiceprintError;
pub use fbank::{Fbank, FbankConfig, cmvn, compute_fbank, l2_normalize};
pub use model::VoiceprintModel;
#[cfg(feature = "onnx")]
pub use onnx::{OnnxModel, OnnxModelConfig};
pub use segment::segment_starts;
pub use similarity::{average, cosine_similarity};
pub use stats::{StatsModel, StatsModelConfig};
