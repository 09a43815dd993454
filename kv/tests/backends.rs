//! The same behavior checks run against every backend.

use std::sync::Arc;

use tempfile::TempDir;
use voicegate_kv::{FsStore, KVError, KVStore, MemoryStore, RedbStore};

fn backends() -> (TempDir, Vec<(&'static str, Arc<dyn KVStore>)>) {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<(&'static str, Arc<dyn KVStore>)> = vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("fs", Arc::new(FsStore::open(dir.path().join("fs")).unwrap())),
        (
            "redb",
            Arc::new(RedbStore::open(dir.path().join("store.redb")).unwrap()),
        ),
    ];
    (dir, stores)
}

#[test]
fn get_put_overwrite() {
    let (_dir, stores) = backends();
    for (name, store) in stores {
        assert_eq!(store.get("alice.wav").unwrap(), None, "{name}");
        store.put("alice.wav", b"one").unwrap();
        store.put("alice.wav", b"two").unwrap();
        assert_eq!(store.get("alice.wav").unwrap(), Some(b"two".to_vec()), "{name}");
        assert!(store.contains("alice.wav").unwrap(), "{name}");
    }
}

#[test]
fn list_by_suffix_sorted() {
    let (_dir, stores) = backends();
    for (name, store) in stores {
        store
            .batch_put(&[
                ("carol.wav", b"c"),
                ("alice.wav", b"a"),
                ("alice.json", b"{}"),
                ("bob.wav", b"b"),
            ])
            .unwrap();
        assert_eq!(
            store.list_suffix(".wav").unwrap(),
            vec!["alice.wav", "bob.wav", "carol.wav"],
            "{name}"
        );
        assert_eq!(store.keys().unwrap().len(), 4, "{name}");
    }
}

#[test]
fn delete_reports_existence() {
    let (_dir, stores) = backends();
    for (name, store) in stores {
        store.put("k", b"v").unwrap();
        assert!(store.delete("k").unwrap(), "{name}");
        assert!(!store.delete("k").unwrap(), "{name}");
        assert!(!store.contains("k").unwrap(), "{name}");
    }
}

#[test]
fn invalid_keys_rejected() {
    let (_dir, stores) = backends();
    for (name, store) in stores {
        for key in ["", ".x", "a/b"] {
            assert!(
                matches!(store.put(key, b"v"), Err(KVError::InvalidKey(_))),
                "{name} accepted {key:?}"
            );
        }
        assert!(store.keys().unwrap().is_empty(), "{name}");
    }
}
