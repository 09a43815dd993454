use std::path::PathBuf;

use thiserror::Error;
use voicegate_audio::AudioError;
use voicegate_kv::KVError;
use voicegate_voiceprint::VoiceprintError;

/// Errors from enrollment, verification and sessions.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity: {0:?} is not registered")]
    NotFound(String),

    #[error("identity: {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("identity: invalid username {username:?}: {reason}")]
    InvalidUsername {
        username: String,
        reason: &'static str,
    },

    #[error("identity: empty audio sample")]
    EmptySample,

    #[error("identity: cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("identity: corrupt profile for {username:?}: {source}")]
    Profile {
        username: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("identity: read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Model(#[from] VoiceprintError),

    #[error(transparent)]
    Store(#[from] KVError),
}

impl IdentityError {
    /// Whether the caller supplied bad input, as opposed to an internal failure.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidUsername { .. }
                | Self::EmptySample
                | Self::Audio(_)
                | Self::Model(VoiceprintError::AudioTooShort { .. })
        )
    }
}
