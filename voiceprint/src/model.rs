use crate::VoiceprintError;

/// Extracts speaker embedding vectors from PCM audio.
///
/// # Audio Requirements
///
/// - Format: PCM16 samples
/// - Sample rate: 16000 Hz
/// - Channels: 1 (mono)
/// - Minimum duration: one 25ms analysis frame; a few seconds of speech
///   gives stable embeddings
///
/// # Thread Safety
///
/// Implementations are built once per process and shared behind an `Arc`,
/// so they must be safe for concurrent use.
pub trait VoiceprintModel: Send + Sync {
    /// Computes an L2-normalized speaker embedding.
    fn extract(&self, pcm: &[i16]) -> Result<Vec<f32>, VoiceprintError>;

    /// Returns the dimensionality of the embedding vectors.
    fn dimension(&self) -> usize;

    /// Short backend identifier used in logs and config (e.g. "stats").
    fn name(&self) -> &str;

    /// Cosine score at or above which two embeddings are the same speaker.
    fn default_threshold(&self) -> f32;
}
