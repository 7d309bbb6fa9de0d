/// Cosine similarity clamped to [0, 1].
///
/// Returns 0.0 for empty inputs, mismatched lengths, zero norms and NaN.
/// Negative similarity counts as "no match", not "anti-match".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(0.0, 1.0)
}

/// Maps a similarity in [0, 1] to an integer score in [0, 100].
pub fn similarity_to_score(similarity: f64) -> u8 {
    if !similarity.is_finite() {
        return 0;
    }
    (similarity.clamp(0.0, 1.0) * 100.0).round() as u8
}
