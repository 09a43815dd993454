//! Configuration management for voicegate.
//!
//! Configuration is stored in ~/.voicegate/config.yaml and created with
//! defaults on first use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::Paths;

/// voicegate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub model: ModelConfig,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address; `:8080` binds all interfaces.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Serve this directory at `/` instead of the built-in page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,

    /// Where verified users are redirected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,

    /// Failed sign-in attempts before a session resets.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds an untouched session is kept before it is dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_listen() -> String {
    ":8080".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_session_ttl_secs() -> u64 {
    15 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: None,
            dashboard_url: None,
            max_attempts: default_max_attempts(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Identity store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Lost on exit.
    Memory,
    /// One file per object in a directory.
    #[default]
    Fs,
    /// A single redb database file.
    Redb,
}

/// Identity store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory (fs) or database file (redb). Defaults under ~/.voicegate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Speaker model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Filterbank statistics, no model file.
    #[default]
    Stats,
    /// ONNX speaker embedding network.
    Onnx,
}

/// Speaker model settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub backend: ModelBackend,

    /// ONNX model file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Overrides the model's default decision threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,

    /// ONNX input tensor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_name: Option<String>,

    /// ONNX output tensor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,

    /// ONNX embedding dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
}

impl Config {
    /// Default configuration that saves to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::default()
        }
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the config directory path.
    pub fn dir(&self) -> Option<&Path> {
        self.config_path.parent()
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.dir() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_attempts == 0 {
            anyhow::bail!("server.max_attempts must be at least 1");
        }
        if self.server.session_ttl_secs == 0 {
            anyhow::bail!("server.session_ttl_secs must be at least 1");
        }
        if let Some(t) = self.model.threshold {
            validate_threshold(t).map_err(|e| anyhow::anyhow!("model.threshold: {e}"))?;
        }
        if self.model.backend == ModelBackend::Onnx && self.model.path.is_none() {
            anyhow::bail!("model.path is required for the onnx backend");
        }
        Ok(())
    }

    /// The store location, falling back to a default beside the config file.
    pub fn store_path(&self) -> PathBuf {
        if let Some(p) = &self.store.path {
            return PathBuf::from(p);
        }
        let paths = Paths::from_base(self.dir().unwrap_or(Path::new("")));
        match self.store.backend {
            StoreBackend::Redb => paths.redb_file(),
            StoreBackend::Fs | StoreBackend::Memory => paths.identities_dir(),
        }
    }
}

/// Checks that a decision threshold is a possible cosine score.
pub fn validate_threshold(threshold: f32) -> anyhow::Result<()> {
    if !(-1.0..=1.0).contains(&threshold) {
        anyhow::bail!("threshold {threshold} outside [-1, 1]");
    }
    Ok(())
}

/// Loads the configuration, creating a default file if none exists.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Paths::new()?.config_file(),
    };

    let cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let mut cfg: Config = serde_yaml::from_str(&content)?;
        cfg.config_path = config_path;
        cfg
    } else {
        // Create default config file
        let cfg = Config::new(config_path);
        cfg.save()?;
        cfg
    };

    cfg.validate()?;
    Ok(cfg)
}
