use thiserror::Error;

/// Errors returned while decoding or normalizing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: empty input")]
    Empty,

    #[error("audio: decode wav: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio: unsupported format: {0}")]
    Unsupported(String),

    #[error("audio: resample: {0}")]
    Resample(String),

    #[error("audio: io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}
