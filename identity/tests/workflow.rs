use std::sync::Arc;

use voicegate_audio::Pcm;
use voicegate_identity::{
    AudioSample, IdentityError, IdentityStore, Outcome, Session, SessionConfig, SessionState,
    Verifier,
};
use voicegate_kv::{KVError, KVResult, KVStore, MemoryStore};
use voicegate_voiceprint::{StatsModel, VoiceprintError, VoiceprintModel};

/// Embeds a recording as the sign of its mean: positive-DC "speakers" and
/// negative-DC "speakers" score -1 against each other.
struct PolarityModel;

impl VoiceprintModel for PolarityModel {
    fn extract(&self, pcm: &[i16]) -> Result<Vec<f32>, VoiceprintError> {
        if pcm.len() < 400 {
            return Err(VoiceprintError::AudioTooShort {
                min_samples: 400,
                got_samples: pcm.len(),
            });
        }
        let mean = pcm.iter().map(|&s| s as f64).sum::<f64>() / pcm.len() as f64;
        Ok(if mean >= 0.0 { vec![1.0, 0.0] } else { vec![-1.0, 0.0] })
    }

    fn dimension(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "polarity"
    }

    fn default_threshold(&self) -> f32 {
        0.5
    }
}

/// A store whose listing always fails.
struct BrokenListing(MemoryStore);

impl KVStore for BrokenListing {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        self.0.get(key)
    }
    fn put(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.0.put(key, value)
    }
    fn delete(&self, key: &str) -> KVResult<bool> {
        self.0.delete(key)
    }
    fn keys(&self) -> KVResult<Vec<String>> {
        Err(KVError::Storage("bucket unreachable".into()))
    }
}

/// A store that fails every write to a key ending in `suffix`.
struct FailingPuts {
    inner: MemoryStore,
    suffix: &'static str,
}

impl KVStore for FailingPuts {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }
    fn put(&self, key: &str, value: &[u8]) -> KVResult<()> {
        if key.ends_with(self.suffix) {
            return Err(KVError::Storage("disk full".into()));
        }
        self.inner.put(key, value)
    }
    fn delete(&self, key: &str) -> KVResult<bool> {
        self.inner.delete(key)
    }
    fn keys(&self) -> KVResult<Vec<String>> {
        self.inner.keys()
    }
}

fn wav(level: i16) -> Vec<u8> {
    voicegate_audio::wav::encode(&Pcm::new(16000, vec![level; 8000])).unwrap()
}

fn voice_wav(f0: f64) -> Vec<u8> {
    let samples = (0..32000)
        .map(|i| {
            let t = i as f64 / 16000.0;
            let s: f64 = (1..=6)
                .map(|h| (2.0 * std::f64::consts::PI * f0 * h as f64 * t).sin() / h as f64)
                .sum();
            (s * 5000.0) as i16
        })
        .collect();
    voicegate_audio::wav::encode(&Pcm::new(16000, samples)).unwrap()
}

fn setup() -> (IdentityStore, Verifier) {
    (
        IdentityStore::new(Arc::new(MemoryStore::new())),
        Verifier::new(Arc::new(PolarityModel)),
    )
}

#[test]
fn same_recording_is_same_speaker_with_baseline_model() {
    let verifier = Verifier::new(Arc::new(StatsModel::default()));
    let sample = AudioSample::Bytes(voice_wav(140.0));
    let result = verifier.verify(&sample, &sample).unwrap();
    assert!(result.same_speaker, "{result:?}");
    assert!(result.score > 0.999);
    assert_eq!(result.threshold, 0.85);
    assert_eq!(result.outcome().message(), "Voice verified successfully!");
}

#[test]
fn baseline_scores_different_voices_below_identical() {
    let verifier = Verifier::new(Arc::new(StatsModel::default()));
    let a = AudioSample::Bytes(voice_wav(110.0));
    let b = AudioSample::Bytes(voice_wav(700.0));
    let same = verifier.verify(&a, &a).unwrap().score;
    let different = verifier.verify(&a, &b).unwrap().score;
    assert!(different < same, "{different} vs {same}");
}

#[test]
fn different_speakers_rejected() {
    let (_, verifier) = setup();
    let result = verifier
        .verify(&AudioSample::Bytes(wav(1000)), &AudioSample::Bytes(wav(-1000)))
        .unwrap();
    assert!(!result.same_speaker);
    assert_eq!(result.outcome(), Outcome::Rejected);
    assert_eq!(
        result.outcome().message(),
        "Voice verification failed. Please try again."
    );
}

#[test]
fn bytes_and_path_give_identical_result() {
    let verifier = Verifier::new(Arc::new(StatsModel::default()));
    let reference = AudioSample::Bytes(voice_wav(120.0));
    let data = voice_wav(150.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("challenge.wav");
    std::fs::write(&path, &data).unwrap();

    let by_bytes = verifier.verify(&reference, &AudioSample::Bytes(data)).unwrap();
    let by_path = verifier.verify(&reference, &AudioSample::Path(path)).unwrap();
    assert_eq!(by_bytes, by_path);
}

#[test]
fn threshold_override() {
    let verifier = Verifier::new(Arc::new(PolarityModel)).with_threshold(-1.0);
    let result = verifier
        .verify(&AudioSample::Bytes(wav(1000)), &AudioSample::Bytes(wav(-1000)))
        .unwrap();
    assert!(result.same_speaker);
}

#[test]
fn short_audio_is_model_error() {
    let (_, verifier) = setup();
    let short = AudioSample::Bytes(
        voicegate_audio::wav::encode(&Pcm::new(16000, vec![5; 100])).unwrap(),
    );
    let err = verifier.verify(&short, &short).unwrap_err();
    assert!(matches!(err, IdentityError::Model(VoiceprintError::AudioTooShort { .. })));
    assert!(err.is_bad_input());
}

#[test]
fn unregistered_user_not_found_before_verification() {
    let (store, _) = setup();
    assert!(!store.is_registered("ghost").unwrap());
    assert!(matches!(
        store.fetch_reference("ghost"),
        Err(IdentityError::NotFound(name)) if name == "ghost"
    ));
}

#[test]
fn sign_up_then_sign_in() {
    let (store, verifier) = setup();

    let mut session = Session::new(store.directory(), SessionConfig::default());
    assert!(matches!(
        session.begin("alice").unwrap(),
        SessionState::SigningUp { .. }
    ));
    let sub = session
        .submit(&AudioSample::Bytes(wav(1000)), &store, &verifier)
        .unwrap();
    assert_eq!(sub.outcome, Outcome::Enrolled);
    assert_eq!(sub.profile.as_ref().unwrap().username, "alice");
    assert_eq!(
        session.state(),
        &SessionState::Verified {
            username: "alice".into()
        }
    );

    // A new session sees alice in its directory.
    let mut session = Session::new(store.directory(), SessionConfig::default());
    assert!(matches!(
        session.begin("alice").unwrap(),
        SessionState::SigningIn { attempts: 0, .. }
    ));
    let sub = session
        .submit(&AudioSample::Bytes(wav(900)), &store, &verifier)
        .unwrap();
    assert_eq!(sub.outcome, Outcome::Verified);
    assert!(sub.result.unwrap().same_speaker);
    assert_eq!(session.state().username(), Some("alice"));
}

#[test]
fn failed_attempts_reset_session() {
    let (store, verifier) = setup();
    store.enroll("bob", &AudioSample::Bytes(wav(1000))).unwrap();

    let config = SessionConfig {
        max_attempts: 2,
        dashboard_url: None,
    };
    let mut session = Session::new(store.directory(), config);
    session.begin("bob").unwrap();

    let impostor = AudioSample::Bytes(wav(-1000));
    let first = session.submit(&impostor, &store, &verifier).unwrap();
    assert_eq!(first.outcome, Outcome::Rejected);
    assert!(!first.locked_out);
    assert_eq!(
        session.state(),
        &SessionState::SigningIn {
            username: "bob".into(),
            attempts: 1
        }
    );

    let second = session.submit(&impostor, &store, &verifier).unwrap();
    assert!(second.locked_out);
    assert_eq!(session.state(), &SessionState::Anonymous);
}

#[test]
fn redirect_only_when_verified() {
    let (store, verifier) = setup();
    let config = SessionConfig {
        dashboard_url: Some("https://dashboard.example/home".into()),
        ..SessionConfig::default()
    };
    let mut session = Session::new(store.directory(), config);
    assert_eq!(session.redirect(), None);
    session.begin("carol").unwrap();
    assert_eq!(session.redirect(), None);
    session
        .submit(&AudioSample::Bytes(wav(1000)), &store, &verifier)
        .unwrap();
    assert_eq!(session.redirect(), Some("https://dashboard.example/home"));

    session.reset();
    assert_eq!(session.state(), &SessionState::Anonymous);
    assert_eq!(session.redirect(), None);
}

#[test]
fn invalid_transitions() {
    let (store, verifier) = setup();
    let sample = AudioSample::Bytes(wav(1000));
    let mut session = Session::new(store.directory(), SessionConfig::default());

    assert!(matches!(
        session.submit(&sample, &store, &verifier),
        Err(IdentityError::InvalidTransition { state: "anonymous", .. })
    ));
    assert!(matches!(
        session.begin(""),
        Err(IdentityError::InvalidUsername { .. })
    ));
    assert_eq!(session.state(), &SessionState::Anonymous);

    session.begin("dave").unwrap();
    assert!(matches!(
        session.begin("erin"),
        Err(IdentityError::InvalidTransition { .. })
    ));
    session.submit(&sample, &store, &verifier).unwrap();
    assert!(matches!(
        session.submit(&sample, &store, &verifier),
        Err(IdentityError::InvalidTransition { state: "verified", .. })
    ));
}

#[test]
fn failed_submission_keeps_state() {
    let (store, verifier) = setup();
    let mut session = Session::new(store.directory(), SessionConfig::default());
    session.begin("frank").unwrap();
    let err = session.submit(&AudioSample::Bytes(b"junk".to_vec()), &store, &verifier);
    assert!(matches!(err, Err(IdentityError::Audio(_))));
    assert!(matches!(session.state(), SessionState::SigningUp { .. }));
}

#[test]
fn stale_directory_is_not_refreshed() {
    let (store, verifier) = setup();
    let mut session = Session::new(store.directory(), SessionConfig::default());

    store.enroll("gina", &AudioSample::Bytes(wav(1000))).unwrap();

    // The snapshot predates gina's enrollment, so this is a sign-up and the
    // store rejects the duplicate.
    session.begin("gina").unwrap();
    assert!(matches!(session.state(), SessionState::SigningUp { .. }));
    assert!(matches!(
        session.submit(&AudioSample::Bytes(wav(1000)), &store, &verifier),
        Err(IdentityError::AlreadyRegistered(_))
    ));
}

#[test]
fn listing_failure_degrades_to_empty_directory() {
    let inner = MemoryStore::new();
    inner.put("hank.wav", &wav(1000)).unwrap();
    let store = IdentityStore::new(Arc::new(BrokenListing(inner)));

    assert!(store.list_identities().is_err());
    let directory = store.directory();
    assert!(directory.is_empty());

    // Direct lookups still work.
    assert!(store.is_registered("hank").unwrap());
}

#[test]
fn failed_enrollment_leaves_no_identity() {
    for suffix in [".json", ".wav"] {
        let inner = MemoryStore::new();
        let failing = IdentityStore::new(Arc::new(FailingPuts {
            inner: inner.clone(),
            suffix,
        }));

        let err = failing.enroll("alice", &AudioSample::Bytes(wav(1000))).unwrap_err();
        assert!(matches!(err, IdentityError::Store(_)), "{suffix}: {err}");
        assert!(!failing.is_registered("alice").unwrap(), "{suffix}");
        assert!(inner.keys().unwrap().is_empty(), "{suffix}");

        // Once the store recovers the same username can enroll.
        let healthy = IdentityStore::new(Arc::new(inner));
        healthy.enroll("alice", &AudioSample::Bytes(wav(1000))).unwrap();
        assert!(healthy.is_registered("alice").unwrap());
        assert_eq!(healthy.profile("alice").unwrap().username, "alice");
    }
}

#[test]
fn crafted_header_rate_is_rejected() {
    let (_, verifier) = setup();
    let mut bytes = wav(1000);
    bytes[24..28].copy_from_slice(&2_147_483_647u32.to_le_bytes());
    bytes[28..32].copy_from_slice(&4_294_967_294u32.to_le_bytes());

    let sample = AudioSample::Bytes(bytes);
    let err = verifier.verify(&sample, &sample).unwrap_err();
    assert!(matches!(err, IdentityError::Audio(_)), "{err}");
    assert!(err.is_bad_input());
}
