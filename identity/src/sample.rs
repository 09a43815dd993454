use std::borrow::Cow;
use std::path::{Path, PathBuf};

use voicegate_audio::{MODEL_SAMPLE_RATE, Pcm};

use crate::error::IdentityError;

/// Encoded audio handed to the workflow: in-memory WAV bytes or a WAV file.
///
/// Both forms decode identically; a path is only read, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSample {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl AudioSample {
    /// The encoded bytes. Reads the file for [`AudioSample::Path`].
    pub fn load(&self) -> Result<Cow<'_, [u8]>, IdentityError> {
        match self {
            Self::Bytes(data) => Ok(Cow::Borrowed(data)),
            Self::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| IdentityError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }

    /// Decode to 16kHz mono PCM16, the model input format.
    pub fn to_pcm(&self) -> Result<Pcm, IdentityError> {
        decode(&self.load()?)
    }
}

pub(crate) fn decode(data: &[u8]) -> Result<Pcm, IdentityError> {
    if data.is_empty() {
        return Err(IdentityError::EmptySample);
    }
    Ok(voicegate_audio::normalize(data, MODEL_SAMPLE_RATE)?)
}

impl From<Vec<u8>> for AudioSample {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<&[u8]> for AudioSample {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

impl From<PathBuf> for AudioSample {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AudioSample {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}
