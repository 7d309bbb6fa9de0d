//! Ranking Engine — scores a candidate pool against one job and sorts it.
//!
//! Per candidate: cosine similarity when both embeddings are valid, keyword
//! overlap otherwise. No network calls; pure and synchronous.
//!
//! `AppState` holds an `Arc<dyn Scorer>` so an alternative backend can be
//! swapped in without touching handlers.

use tracing::debug;

use crate::matching::keyword::KeywordScorer;
use crate::matching::similarity::{cosine_similarity, similarity_to_score};
use crate::matching::types::{CandidateProfile, JobDescriptor, ScoreMethod, ScoredCandidate};
use crate::matching::validator::is_valid_embedding;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic scoring backend. Implementations must not perform I/O.
pub trait Scorer: Send + Sync {
    fn rank(&self, job: &JobDescriptor, candidates: &[CandidateProfile]) -> Vec<ScoredCandidate>;

    /// Label surfaced in API responses.
    fn backend(&self) -> &'static str;
}

/// Vector similarity with keyword fallback. The default backend.
pub struct HybridScorer;

impl Scorer for HybridScorer {
    fn rank(&self, job: &JobDescriptor, candidates: &[CandidateProfile]) -> Vec<ScoredCandidate> {
        rank_candidates(job, candidates)
    }

    fn backend(&self) -> &'static str {
        "hybrid"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core ranking algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Scores every candidate and returns them sorted by descending `match_score`.
/// Ties keep their input order.
pub fn rank_candidates(job: &JobDescriptor, candidates: &[CandidateProfile]) -> Vec<ScoredCandidate> {
    // Job is constant across the loop; validate it once.
    let job_vector = job.embedding.as_deref().filter(|v| is_valid_embedding(v));
    let keyword_scorer = KeywordScorer::for_job(job);

    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|candidate| {
            let candidate_vector = candidate
                .embedding
                .as_deref()
                .filter(|v| is_valid_embedding(v));

            match (job_vector, candidate_vector) {
                (Some(job_vec), Some(candidate_vec)) => ScoredCandidate::new(
                    candidate.clone(),
                    similarity_to_score(cosine_similarity(job_vec, candidate_vec)),
                    ScoreMethod::Vector,
                ),
                _ => ScoredCandidate::new(
                    candidate.clone(),
                    keyword_scorer.score(candidate),
                    ScoreMethod::Keyword,
                ),
            }
        })
        .collect();

    let vector_count = ranked
        .iter()
        .filter(|s| s.score_method == ScoreMethod::Vector)
        .count();
    debug!(
        "Ranked {} candidates (vector={}, keyword={}, job_embedding_valid={})",
        ranked.len(),
        vector_count,
        ranked.len() - vector_count,
        job_vector.is_some()
    );

    sort_by_score_desc(&mut ranked);
    ranked
}

/// Sorts descending by `match_score`. `slice::sort_by` is a stable sort, so
/// equal scores keep their relative order.
pub(crate) fn sort_by_score_desc(ranked: &mut [ScoredCandidate]) {
    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
}
