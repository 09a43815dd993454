//! Sign-in / sign-up flow for one user interaction.
//!
//! ```text
//!   Anonymous --begin(name)--> SigningIn   (name in directory)
//!                          \-> SigningUp   (otherwise)
//!   SigningUp --submit--> Verified                      (enrolled)
//!   SigningIn --submit--> Verified                      (same speaker)
//!                     \-> SigningIn { attempts + 1 }    (rejected)
//!                     \-> Anonymous                     (max_attempts reached)
//! ```
//!
//! `reset` returns to `Anonymous` from any state.

use serde::Serialize;

use crate::directory::Directory;
use crate::error::IdentityError;
use crate::sample::AudioSample;
use crate::store::{IdentityStore, Profile};
use crate::username::validate_username;
use crate::verifier::{Outcome, VerificationResult, Verifier};

/// Failed sign-in attempts allowed before the session resets.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    SigningIn { username: String, attempts: u32 },
    SigningUp { username: String },
    Verified { username: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::SigningIn { .. } => "signing_in",
            Self::SigningUp { .. } => "signing_up",
            Self::Verified { .. } => "verified",
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::SigningIn { username, .. }
            | Self::SigningUp { username }
            | Self::Verified { username } => Some(username),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_attempts: u32,
    /// Where a verified user is sent.
    pub dashboard_url: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            dashboard_url: None,
        }
    }
}

/// Result of submitting a sample to a session.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub outcome: Outcome,
    /// Present for sign-in attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<VerificationResult>,
    /// Present for sign-ups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// The failure limit was hit and the session went back to anonymous.
    pub locked_out: bool,
}

impl Submission {
    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }
}

/// One user's pass through the sign-in / sign-up flow.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    directory: Directory,
    config: SessionConfig,
}

impl Session {
    pub fn new(directory: Directory, config: SessionConfig) -> Self {
        Self {
            state: SessionState::Anonymous,
            directory,
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Enter a username. Known names sign in, unknown names sign up.
    pub fn begin(&mut self, username: &str) -> Result<&SessionState, IdentityError> {
        if self.state != SessionState::Anonymous {
            return Err(self.invalid("begin"));
        }
        validate_username(username)?;

        let username = username.to_string();
        self.state = if self.directory.contains(&username) {
            SessionState::SigningIn {
                username,
                attempts: 0,
            }
        } else {
            SessionState::SigningUp { username }
        };
        tracing::debug!(state = self.state.name(), "session begin");
        Ok(&self.state)
    }

    /// Submit a recording: enroll it when signing up, verify it when
    /// signing in. Errors leave the state unchanged.
    pub fn submit(
        &mut self,
        sample: &AudioSample,
        store: &IdentityStore,
        verifier: &Verifier,
    ) -> Result<Submission, IdentityError> {
        match self.state.clone() {
            SessionState::SigningUp { username } => {
                let profile = store.enroll(&username, sample)?;
                self.state = SessionState::Verified { username };
                Ok(Submission {
                    outcome: Outcome::Enrolled,
                    result: None,
                    profile: Some(profile),
                    locked_out: false,
                })
            }
            SessionState::SigningIn { username, attempts } => {
                let reference = store.fetch_reference(&username)?;
                let result = verifier.verify(&reference, sample)?;

                let mut locked_out = false;
                self.state = if result.same_speaker {
                    SessionState::Verified { username }
                } else if attempts + 1 >= self.config.max_attempts {
                    tracing::warn!(username = %username, "too many failed attempts, session reset");
                    locked_out = true;
                    SessionState::Anonymous
                } else {
                    SessionState::SigningIn {
                        username,
                        attempts: attempts + 1,
                    }
                };
                Ok(Submission {
                    outcome: result.outcome(),
                    result: Some(result),
                    profile: None,
                    locked_out,
                })
            }
            SessionState::Anonymous | SessionState::Verified { .. } => {
                Err(self.invalid("submit a sample"))
            }
        }
    }

    /// Back to anonymous from any state.
    pub fn reset(&mut self) {
        self.state = SessionState::Anonymous;
    }

    /// Dashboard URL once verified.
    pub fn redirect(&self) -> Option<&str> {
        match self.state {
            SessionState::Verified { .. } => self.config.dashboard_url.as_deref(),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> IdentityError {
        IdentityError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
