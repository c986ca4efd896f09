//! Cosine similarity between two embedding vectors.

use crate::AnalysisError;

/// Cosine of the angle between `a` and `b`, clamped to `[-1.0, 1.0]`.
///
/// Sums are accumulated and returned in `f64`, so the score compared against the
/// feedback bounds is never rounded first, and the result is exactly symmetric in
/// its arguments. Vectors of different lengths are rejected, never truncated or
/// padded, and a zero-magnitude side (including an empty vector) is an error
/// rather than `NaN`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, AnalysisError> {
    if a.len() != b.len() {
        return Err(AnalysisError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if !(dot.is_finite() && norm_a.is_finite() && norm_b.is_finite()) {
        return Err(AnalysisError::NonFinite);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(AnalysisError::ZeroVector);
    }

    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(cosine.clamp(-1.0, 1.0))
}
