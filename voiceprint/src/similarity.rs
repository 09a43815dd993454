//! Embedding comparison.

use crate::VoiceprintError;

/// Cosine similarity in `[-1, 1]`. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VoiceprintError> {
    if a.len() != b.len() {
        return Err(VoiceprintError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32)
}

/// Averages equally sized embeddings. Returns `None` for an empty slice.
pub fn average(embeddings: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = embeddings.first()?;
    let mut avg = vec![0.0f32; first.len()];
    for emb in embeddings {
        for (acc, &v) in avg.iter_mut().zip(emb) {
            *acc += v;
        }
    }
    let n = embeddings.len() as f32;
    avg.iter_mut().for_each(|v| *v /= n);
    Some(avg)
}
