//! Voice identity: enrollment, verification and sign-in sessions.
//!
//! # Components
//!
//! - [`Verifier`]: same-speaker decision for two [`AudioSample`]s over a
//!   shared [`VoiceprintModel`](voicegate_voiceprint::VoiceprintModel)
//! - [`IdentityStore`]: enrollment samples and profiles in a
//!   [`KVStore`](voicegate_kv::KVStore), keyed `<username>.wav` and
//!   `<username>.json`
//! - [`Directory`]: the username snapshot a session decides against
//! - [`Session`]: the anonymous -> signing in / signing up -> verified flow
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voicegate_identity::{AudioSample, IdentityStore, Session, SessionConfig, Verifier};
//! use voicegate_kv::MemoryStore;
//! use voicegate_voiceprint::StatsModel;
//!
//! let verifier = Verifier::new(Arc::new(StatsModel::default()));
//! let store = IdentityStore::new(Arc::new(MemoryStore::new()));
//!
//! let mut session = Session::new(store.directory(), SessionConfig::default());
//! session.begin("alice")?;
//! let sample = AudioSample::Path("alice.wav".into());
//! let submission = session.submit(&sample, &store, &verifier)?;
//! println!("{}", submission.message());
//! # Ok::<(), voicegate_identity::IdentityError>(())
//! ```

mod directory;
mod error;
mod sample;
mod session;
mod store;
mod username;
mod verifier;

pub use directory::Directory;
pub use error::IdentityError;
pub use sample::AudioSample;
pub use session::{DEFAULT_MAX_ATTEMPTS, Session, SessionConfig, SessionState, Submission};
pub use store::{IdentityStore, Profile};
pub use username::{MAX_USERNAME_LEN, profile_key, sample_key, validate_username};
pub use verifier::{Outcome, VerificationResult, Verifier};
