use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voicegate_kv::KVStore;

use crate::directory::Directory;
use crate::error::IdentityError;
use crate::sample::{AudioSample, decode};
use crate::username::{profile_key, sample_key, validate_username};

const SAMPLE_SUFFIX: &str = ".wav";

/// Metadata stored beside an enrollment sample as `<username>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Size of the stored WAV file.
    pub sample_bytes: usize,
    /// Duration after normalization to the model rate.
    pub duration_ms: u64,
}

/// Registered identities on top of a key-value object store.
///
/// Each identity is `<username>.wav` (the enrollment sample, stored as
/// received) plus `<username>.json` (its [`Profile`]). An identity exists
/// when its sample exists.
#[derive(Clone)]
pub struct IdentityStore {
    kv: Arc<dyn KVStore>,
}

impl IdentityStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    /// Every username with an enrollment sample.
    pub fn list_identities(&self) -> Result<BTreeSet<String>, IdentityError> {
        let keys = self.kv.list_suffix(SAMPLE_SUFFIX)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_suffix(SAMPLE_SUFFIX).map(str::to_string))
            .filter(|name| validate_username(name).is_ok())
            .collect())
    }

    /// Snapshot of the current identities. See [`Directory::load`].
    pub fn directory(&self) -> Directory {
        Directory::load(self)
    }

    /// Live membership check against the store.
    pub fn is_registered(&self, username: &str) -> Result<bool, IdentityError> {
        validate_username(username)?;
        Ok(self.kv.contains(&sample_key(username))?)
    }

    /// Store raw sample bytes, replacing any existing sample.
    pub fn put_sample(&self, username: &str, data: &[u8]) -> Result<(), IdentityError> {
        validate_username(username)?;
        self.kv.put(&sample_key(username), data)?;
        Ok(())
    }

    /// Raw sample bytes, or `None` when the user is not registered.
    pub fn get_sample(&self, username: &str) -> Result<Option<Vec<u8>>, IdentityError> {
        validate_username(username)?;
        Ok(self.kv.get(&sample_key(username))?)
    }

    /// Register a new identity.
    ///
    /// The sample must decode; it is stored as received together with its
    /// profile in one batch. An existing username is rejected, and a failed
    /// write leaves the username unregistered.
    pub fn enroll(&self, username: &str, sample: &AudioSample) -> Result<Profile, IdentityError> {
        validate_username(username)?;
        let data = sample.load()?;
        let pcm = decode(&data)?;

        if self.is_registered(username)? {
            return Err(IdentityError::AlreadyRegistered(username.to_string()));
        }

        let profile = Profile {
            username: username.to_string(),
            created_at: Utc::now(),
            sample_bytes: data.len(),
            duration_ms: pcm.duration().as_millis() as u64,
        };
        let json = serde_json::to_vec_pretty(&profile).map_err(|source| IdentityError::Profile {
            username: username.to_string(),
            source,
        })?;

        // The profile goes first: a user only counts as registered once the
        // sample lands, so a partial write never blocks a retry.
        let sample_key = sample_key(username);
        let profile_key = profile_key(username);
        let entries = [
            (profile_key.as_str(), json.as_slice()),
            (sample_key.as_str(), &data[..]),
        ];
        if let Err(e) = self.kv.batch_put(&entries) {
            for key in [&sample_key, &profile_key] {
                if let Err(cleanup) = self.kv.delete(key) {
                    tracing::warn!(key = %key, error = %cleanup, "enroll cleanup failed");
                }
            }
            return Err(e.into());
        }

        tracing::info!(username, duration_ms = profile.duration_ms, "enrolled identity");
        Ok(profile)
    }

    /// The enrollment sample of a registered user.
    pub fn fetch_reference(&self, username: &str) -> Result<AudioSample, IdentityError> {
        self.get_sample(username)?
            .map(AudioSample::Bytes)
            .ok_or_else(|| IdentityError::NotFound(username.to_string()))
    }

    /// The stored profile of a registered user.
    pub fn profile(&self, username: &str) -> Result<Profile, IdentityError> {
        validate_username(username)?;
        let data = self
            .kv
            .get(&profile_key(username))?
            .ok_or_else(|| IdentityError::NotFound(username.to_string()))?;
        serde_json::from_slice(&data).map_err(|source| IdentityError::Profile {
            username: username.to_string(),
            source,
        })
    }

    /// Delete an identity's sample and profile.
    pub fn remove(&self, username: &str) -> Result<(), IdentityError> {
        validate_username(username)?;
        let had_sample = self.kv.delete(&sample_key(username))?;
        let had_profile = self.kv.delete(&profile_key(username))?;
        if !had_sample && !had_profile {
            return Err(IdentityError::NotFound(username.to_string()));
        }
        tracing::info!(username, "removed identity");
        Ok(())
    }
}

impl std::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicegate_audio::Pcm;
    use voicegate_kv::MemoryStore;

    fn wav(n: usize) -> Vec<u8> {
        let samples = (0..n).map(|i| ((i % 50) as i16 - 25) * 200).collect();
        voicegate_audio::wav::encode(&Pcm::new(16000, samples)).unwrap()
    }

    fn store() -> (MemoryStore, IdentityStore) {
        let kv = MemoryStore::new();
        (kv.clone(), IdentityStore::new(Arc::new(kv)))
    }

    #[test]
    fn enroll_writes_sample_and_profile() {
        let (kv, store) = store();
        let data = wav(8000);
        let profile = store.enroll("alice", &AudioSample::Bytes(data.clone())).unwrap();

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.sample_bytes, data.len());
        assert_eq!(profile.duration_ms, 500);
        assert_eq!(kv.get("alice.wav").unwrap(), Some(data));
        assert_eq!(store.profile("alice").unwrap(), profile);
        assert!(store.is_registered("alice").unwrap());
        assert!(!store.is_registered("Alice").unwrap());
    }

    #[test]
    fn duplicate_enrollment_rejected() {
        let (_, store) = store();
        let sample = AudioSample::Bytes(wav(4000));
        store.enroll("bob", &sample).unwrap();
        assert!(matches!(
            store.enroll("bob", &sample),
            Err(IdentityError::AlreadyRegistered(name)) if name == "bob"
        ));
    }

    #[test]
    fn undecodable_sample_not_stored() {
        let (kv, store) = store();
        let err = store.enroll("carol", &AudioSample::Bytes(b"garbage".to_vec()));
        assert!(matches!(err, Err(IdentityError::Audio(_))));
        let err = store.enroll("carol", &AudioSample::Bytes(Vec::new()));
        assert!(matches!(err, Err(IdentityError::EmptySample)));
        assert!(kv.keys().unwrap().is_empty());
    }

    #[test]
    fn list_and_fetch() {
        let (kv, store) = store();
        store.enroll("bob", &AudioSample::Bytes(wav(4000))).unwrap();
        store.put_sample("alice", &wav(4000)).unwrap();
        kv.put("notes.txt", b"ignored").unwrap();

        let names: Vec<_> = store.list_identities().unwrap().into_iter().collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(matches!(
            store.fetch_reference("alice").unwrap(),
            AudioSample::Bytes(_)
        ));
        assert!(matches!(
            store.fetch_reference("nobody"),
            Err(IdentityError::NotFound(_))
        ));
        assert!(matches!(
            store.profile("alice"),
            Err(IdentityError::NotFound(_))
        ));
    }

    #[test]
    fn remove_identity() {
        let (kv, store) = store();
        store.enroll("dave", &AudioSample::Bytes(wav(4000))).unwrap();
        store.remove("dave").unwrap();
        assert!(kv.keys().unwrap().is_empty());
        assert!(matches!(
            store.remove("dave"),
            Err(IdentityError::NotFound(_))
        ));
    }
}
