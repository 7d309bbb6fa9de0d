//! Embedding validity checks.
//!
//! A vector only reaches cosine scoring when it looks like a real semantic
//! embedding. Zero vectors and uniform-random filler are upstream failures in
//! disguise and are routed to keyword scoring instead.

/// Mean above which an all-non-negative vector is treated as random filler.
///
/// Uniform samples over [0, 1) average ~0.5 and are never negative, while
/// real embeddings are roughly zero-centred with mixed signs. This is a
/// heuristic: a model that emits all-positive, high-mean vectors would be
/// rejected too.
pub const RANDOM_FALLBACK_MEAN_THRESHOLD: f64 = 0.4;

/// Returns true when `vector` is usable for similarity scoring.
pub fn is_valid_embedding(vector: &[f32]) -> bool {
    if vector.is_empty() {
        return false;
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return false;
    }
    if vector.iter().all(|&v| v == 0.0) {
        return false;
    }
    !looks_like_random_fallback(vector)
}

/// Detects vectors that look like `random()` filler rather than model output:
/// every component non-negative and a mean above
/// [`RANDOM_FALLBACK_MEAN_THRESHOLD`].
pub fn looks_like_random_fallback(vector: &[f32]) -> bool {
    if vector.is_empty() || vector.iter().any(|&v| v < 0.0) {
        return false;
    }
    let mean = vector.iter().map(|&v| f64::from(v)).sum::<f64>() / vector.len() as f64;
    mean > RANDOM_FALLBACK_MEAN_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vector_is_invalid() {
        assert!(!is_valid_embedding(&[]));
    }

    #[test]
    fn test_zero_vector_is_invalid() {
        assert!(!is_valid_embedding(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_high_mean_positive_vector_is_rejected_as_random() {
        assert!(!is_valid_embedding(&[0.9, 0.95, 0.88]));
        assert!(looks_like_random_fallback(&[0.9, 0.95, 0.88]));
    }

    #[test]
    fn test_mixed_sign_vector_is_valid() {
        assert!(is_valid_embedding(&[0.12, -0.4, 0.33, -0.02]));
    }

    #[test]
    fn test_non_finite_component_is_invalid() {
        assert!(!is_valid_embedding(&[0.1, f32::NAN, -0.2]));
        assert!(!is_valid_embedding(&[0.1, f32::INFINITY, -0.2]));
    }

    #[test]
    fn test_low_mean_positive_vector_is_valid() {
        // All non-negative, mean 0.2 is below the threshold.
        assert!(is_valid_embedding(&[0.1, 0.3, 0.2]));
    }

    /// Known limitation: an embedding model whose outputs are legitimately
    /// all-positive with a high mean is misclassified as random filler. The
    /// threshold is left as-is until such a model is actually in use.
    #[test]
    fn test_heuristic_misclassifies_all_positive_high_mean_model_output() {
        let legitimate_but_positive = [0.45, 0.52, 0.61, 0.43, 0.58];
        assert!(!is_valid_embedding(&legitimate_but_positive));
    }
}
