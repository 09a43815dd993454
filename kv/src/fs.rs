//! Directory-backed key-value store: one file per key.
//!
//! The layout mirrors an object-store bucket, so a directory of
//! `alice.wav` / `alice.json` files can be inspected or synced with
//! ordinary tools.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{KVResult, KVStore, validate_key};

/// A key-value store that keeps each value in `<root>/<key>`.
///
/// Writes go to a hidden temporary file first and are renamed into place,
/// so readers never observe a partially written value. Hidden files are
/// not keys.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> KVResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened fs store");
        Ok(Self { root })
    }

    /// The directory holding the objects.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> KVResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl KVStore for FsStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        match fs::read(self.path(key)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> KVResult<()> {
        let path = self.path(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> KVResult<bool> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> KVResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(name = ?entry.file_name(), "skipping non-utf8 file");
                continue;
            };
            if validate_key(&name).is_ok() {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fs_basic() {
        let dir = tempdir().unwrap();
        let store = FsStore::open(dir.path().join("bucket")).unwrap();

        store.put("alice.wav", b"RIFF....").unwrap();
        assert_eq!(store.get("alice.wav").unwrap(), Some(b"RIFF....".to_vec()));
        assert!(store.root().join("alice.wav").is_file());

        assert!(store.delete("alice.wav").unwrap());
        assert!(!store.delete("alice.wav").unwrap());
        assert_eq!(store.get("alice.wav").unwrap(), None);
    }

    #[test]
    fn test_fs_ignores_hidden_and_dirs() {
        let dir = tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.put("bob.json", b"{}").unwrap();
        fs::write(dir.path().join(".bob.json.tmp"), b"partial").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["bob.json"]);
    }

    #[test]
    fn test_fs_rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = FsStore::open(dir.path().join("bucket")).unwrap();
        assert!(store.put("../escape", b"x").is_err());
        assert!(store.get("..").is_err());
        assert!(!dir.path().join("escape").exists());
    }
}
