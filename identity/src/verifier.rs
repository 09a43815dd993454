use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use voicegate_voiceprint::{VoiceprintModel, cosine_similarity};

use crate::error::IdentityError;
use crate::sample::AudioSample;

/// Score and decision for one reference/challenge pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Cosine similarity of the two embeddings, in `[-1, 1]`.
    pub score: f32,
    /// `score >= threshold`.
    pub same_speaker: bool,
    pub threshold: f32,
}

impl VerificationResult {
    pub fn new(score: f32, threshold: f32) -> Self {
        Self {
            score,
            same_speaker: score >= threshold,
            threshold,
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.same_speaker {
            Outcome::Verified
        } else {
            Outcome::Rejected
        }
    }
}

/// What the user is told after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Verified,
    Rejected,
    Enrolled,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Verified => "Voice verified successfully!",
            Self::Rejected => "Voice verification failed. Please try again.",
            Self::Enrolled => "Voice enrolled successfully!",
        }
    }

    pub fn is_success(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Same-speaker decision over a shared, long-lived model.
///
/// Cloning is cheap; every clone uses the same model instance.
#[derive(Clone)]
pub struct Verifier {
    model: Arc<dyn VoiceprintModel>,
    threshold: f32,
}

impl Verifier {
    /// Uses the model's own default threshold.
    pub fn new(model: Arc<dyn VoiceprintModel>) -> Self {
        let threshold = model.default_threshold();
        Self { model, threshold }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn model(&self) -> &dyn VoiceprintModel {
        self.model.as_ref()
    }

    /// Decode a sample and extract its embedding.
    pub fn embed(&self, sample: &AudioSample) -> Result<Vec<f32>, IdentityError> {
        let pcm = sample.to_pcm()?;
        Ok(self.model.extract(pcm.samples())?)
    }

    /// Compare a challenge against a reference recording.
    pub fn verify(
        &self,
        reference: &AudioSample,
        challenge: &AudioSample,
    ) -> Result<VerificationResult, IdentityError> {
        let a = self.embed(reference)?;
        let b = self.embed(challenge)?;
        let score = cosine_similarity(&a, &b)?;
        let result = VerificationResult::new(score, self.threshold);

        tracing::info!(
            model = self.model.name(),
            score = result.score,
            threshold = result.threshold,
            same_speaker = result.same_speaker,
            "voice verification"
        );
        Ok(result)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("model", &self.model.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}
