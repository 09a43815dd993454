//! Redb-based persistent key-value store implementation.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{KVError, KVResult, KVStore, validate_key};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("objects");

fn storage_err(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// A persistent key-value store backed by redb.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(storage_err)?;

        // Create the table if it doesn't exist
        let tx = db.begin_write().map_err(storage_err)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;

        tracing::debug!(path = %path.display(), "opened redb store");
        Ok(Self { db })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let tx = self.db.begin_read().map_err(storage_err)?;
        let table = tx.open_table(TABLE).map_err(storage_err)?;
        Ok(table
            .get(key)
            .map_err(storage_err)?
            .map(|v| v.value().to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.batch_put(&[(key, value)])
    }

    fn delete(&self, key: &str) -> KVResult<bool> {
        validate_key(key)?;
        let tx = self.db.begin_write().map_err(storage_err)?;
        let existed = {
            let mut table = tx.open_table(TABLE).map_err(storage_err)?;
            let removed = table.remove(key).map_err(storage_err)?;
            removed.is_some()
        };
        tx.commit().map_err(storage_err)?;
        Ok(existed)
    }

    fn keys(&self) -> KVResult<Vec<String>> {
        let tx = self.db.begin_read().map_err(storage_err)?;
        let table = tx.open_table(TABLE).map_err(storage_err)?;

        // redb iterates in key order.
        let mut keys = Vec::new();
        for item in table.iter().map_err(storage_err)? {
            let (key, _) = item.map_err(storage_err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    fn batch_put(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        for (key, _) in entries {
            validate_key(key)?;
        }
        let tx = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage_err)?;
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)?;
        Ok(())
    }
}
