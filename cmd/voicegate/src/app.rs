//! Builds the long-lived store and model from configuration.

use std::sync::Arc;

use anyhow::Context as _;
use voicegate_cli::{Config, ModelBackend, ModelConfig, StoreBackend};
use voicegate_identity::{IdentityStore, Verifier};
use voicegate_kv::{FsStore, KVStore, MemoryStore, RedbStore};
use voicegate_voiceprint::{StatsModel, VoiceprintModel};

/// Opens the configured identity store.
pub fn build_store(cfg: &Config) -> anyhow::Result<IdentityStore> {
    let kv: Arc<dyn KVStore> = match cfg.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Fs => {
            let path = cfg.store_path();
            Arc::new(
                FsStore::open(&path)
                    .with_context(|| format!("open store directory {}", path.display()))?,
            )
        }
        StoreBackend::Redb => {
            let path = cfg.store_path();
            Arc::new(
                RedbStore::open(&path)
                    .with_context(|| format!("open redb store {}", path.display()))?,
            )
        }
    };
    tracing::debug!(backend = ?cfg.store.backend, "identity store ready");
    Ok(IdentityStore::new(kv))
}

/// Loads the configured speaker model. Called once per process.
pub fn build_model(cfg: &ModelConfig) -> anyhow::Result<Arc<dyn VoiceprintModel>> {
    let model: Arc<dyn VoiceprintModel> = match cfg.backend {
        ModelBackend::Stats => Arc::new(StatsModel::default()),
        ModelBackend::Onnx => load_onnx(cfg)?,
    };
    tracing::info!(
        model = model.name(),
        dimension = model.dimension(),
        "speaker model loaded"
    );
    Ok(model)
}

#[cfg(feature = "onnx")]
fn load_onnx(cfg: &ModelConfig) -> anyhow::Result<Arc<dyn VoiceprintModel>> {
    use voicegate_voiceprint::{OnnxModel, OnnxModelConfig};

    let path = cfg
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("model.path is required for the onnx backend"))?;
    let mut onnx = OnnxModelConfig::default();
    if let Some(name) = &cfg.input_name {
        onnx.input_name = name.clone();
    }
    if let Some(name) = &cfg.output_name {
        onnx.output_name = name.clone();
    }
    if let Some(dim) = cfg.dim {
        onnx.dim = dim;
    }
    let model = OnnxModel::from_file(path, onnx).with_context(|| format!("load model {path}"))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_cfg: &ModelConfig) -> anyhow::Result<Arc<dyn VoiceprintModel>> {
    anyhow::bail!("this build has no onnx support; rebuild with --features onnx")
}

/// Wraps a model with the configured threshold.
pub fn build_verifier(cfg: &ModelConfig) -> anyhow::Result<Verifier> {
    let verifier = Verifier::new(build_model(cfg)?);
    Ok(match cfg.threshold {
        Some(t) => verifier.with_threshold(t),
        None => verifier,
    })
}
