//! Path utilities for voicegate.

use std::io;
use std::path::{Path, PathBuf};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voicegate";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Provides access to the voicegate directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Paths under the user's home directory.
    pub fn new() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self::with_home(home_dir))
    }

    /// Paths under an explicit home directory.
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        Self::from_base(home.as_ref().join(DEFAULT_BASE_DIR))
    }

    /// Paths rooted directly at `base`, e.g. the directory of a custom
    /// config file.
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    /// Returns the base directory (~/.voicegate).
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the config file path (~/.voicegate/config.yaml).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(DEFAULT_CONFIG_FILE)
    }

    /// Returns the identity object directory (~/.voicegate/identities).
    pub fn identities_dir(&self) -> PathBuf {
        self.base_dir.join("identities")
    }

    /// Returns the redb database path (~/.voicegate/identities.redb).
    pub fn redb_file(&self) -> PathBuf {
        self.base_dir.join("identities.redb")
    }
}
