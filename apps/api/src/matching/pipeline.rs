//! Matching pipeline — rank → diversify → truncate → optional enrichment.
//!
//! Flow: [fill missing embeddings] → scorer.rank() → diversify() → limit →
//!       enrich_top() on the head of the list.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::llm_client::embedding::{embed_or_empty, EmbeddingSource};
use crate::matching::deep_match::{enrich_top, Enricher};
use crate::matching::diversity::diversify;
use crate::matching::ranking::Scorer;
use crate::matching::types::{CandidateProfile, JobDescriptor, ScoredCandidate};

/// Per-request knobs for a match run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    pub diversify: bool,
    /// Number of top results to send for qualitative review. 0 disables it.
    pub deep_match_top: usize,
    /// Embed job/candidates that arrive without an embedding.
    pub embed_missing: bool,
    pub limit: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            diversify: true,
            deep_match_top: 0,
            embed_missing: false,
            limit: None,
        }
    }
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub results: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    pub diversified: bool,
    pub enriched: usize,
}

/// Runs the deterministic ranking and, when requested, the enrichment pass.
/// `max_deep_top` caps `options.deep_match_top`.
pub async fn run_match(
    scorer: &dyn Scorer,
    enricher: &dyn Enricher,
    job: &JobDescriptor,
    candidates: &[CandidateProfile],
    options: &MatchOptions,
    max_deep_top: usize,
) -> MatchOutcome {
    let mut results = scorer.rank(job, candidates);

    if options.diversify {
        results = diversify(results);
    }

    if let Some(limit) = options.limit {
        results.truncate(limit);
    }

    let deep_top = options.deep_match_top.min(max_deep_top);
    let enriched = enrich_top(enricher, job, &mut results, deep_top).await;

    info!(
        "Matched {} candidates against '{}' (backend={}, diversified={}, enriched={})",
        candidates.len(),
        job.title,
        scorer.backend(),
        options.diversify,
        enriched
    );

    MatchOutcome {
        results,
        total_candidates: candidates.len(),
        diversified: options.diversify,
        enriched,
    }
}

/// Embeds the job and every candidate whose embedding is absent, with at most
/// `concurrency` requests in flight. Failures leave an empty vector, which
/// routes that comparison to keyword scoring.
pub async fn fill_missing_embeddings(
    embedder: &dyn EmbeddingSource,
    job: &mut JobDescriptor,
    candidates: &mut [CandidateProfile],
    concurrency: usize,
) {
    if job.embedding.is_none() {
        job.embedding = Some(embed_or_empty(embedder, &job.embedding_text()).await);
    }

    let missing: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.embedding.is_none())
        .map(|(i, _)| i)
        .collect();

    let texts: Vec<String> = missing
        .iter()
        .map(|&i| candidates[i].embedding_text())
        .collect();
    let vectors: Vec<Vec<f32>> = stream::iter(texts)
        .map(|t| async move { embed_or_empty(embedder, &t).await })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    for (i, vector) in missing.into_iter().zip(vectors) {
        candidates[i].embedding = Some(vector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::matching::deep_match::DeepMatch;
    use crate::matching::ranking::HybridScorer;
    use crate::matching::types::ScoreMethod;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedEnricher;

    #[async_trait]
    impl Enricher for FixedEnricher {
        async fn deep_match(&self, _job: &JobDescriptor, _c: &CandidateProfile) -> DeepMatch {
            DeepMatch {
                score: 75,
                reasoning: "fixed".to_string(),
            }
        }
    }

    /// Embeds only texts mentioning "rust"; everything else fails.
    struct PickyEmbedder;

    #[async_trait]
    impl EmbeddingSource for PickyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
            if text.to_lowercase().contains("rust") {
                Ok(vec![0.2, -0.1, 0.3])
            } else {
                Err(LlmError::EmptyContent)
            }
        }
    }

    /// Records the peak number of overlapping `embed` calls.
    #[derive(Default)]
    struct CountingEmbedder {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingSource for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![0.2, -0.1, 0.3])
        }
    }

    fn job() -> JobDescriptor {
        JobDescriptor {
            title: "Rust Engineer".to_string(),
            description: "Services in Rust".to_string(),
            embedding: None,
        }
    }

    fn acme_pool(n: usize) -> Vec<CandidateProfile> {
        (0..n)
            .map(|i| CandidateProfile {
                first_name: format!("c{i}"),
                current_company: "Acme".to_string(),
                current_title: (if i % 2 == 0 { "Rust Engineer" } else { "Chef" }).to_string(),
                skills: vec!["rust".to_string()],
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_run_match_diversifies_limits_and_enriches() {
        let options = MatchOptions {
            deep_match_top: 2,
            limit: Some(6),
            ..Default::default()
        };
        let outcome = run_match(&HybridScorer, &FixedEnricher, &job(), &acme_pool(8), &options, 10).await;

        assert_eq!(outcome.total_candidates, 8);
        assert_eq!(outcome.results.len(), 6);
        assert!(outcome.diversified);
        assert_eq!(outcome.enriched, 2);
        assert_eq!(outcome.results[0].deep_score, Some(75));
        assert!(outcome.results[2].deep_score.is_none());
        assert!(outcome.results.iter().any(|s| s.biased_flag == Some(true)));
        assert!(outcome.results.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }

    #[tokio::test]
    async fn test_run_match_without_diversity_has_no_flags() {
        let options = MatchOptions {
            diversify: false,
            ..Default::default()
        };
        let outcome = run_match(&HybridScorer, &FixedEnricher, &job(), &acme_pool(8), &options, 10).await;
        assert!(outcome.results.iter().all(|s| s.biased_flag.is_none()));
        assert_eq!(outcome.enriched, 0);
    }

    #[tokio::test]
    async fn test_deep_match_top_is_capped() {
        let options = MatchOptions {
            deep_match_top: 50,
            ..Default::default()
        };
        let outcome = run_match(&HybridScorer, &FixedEnricher, &job(), &acme_pool(8), &options, 3).await;
        assert_eq!(outcome.enriched, 3);
    }

    #[tokio::test]
    async fn test_fill_missing_embeddings_substitutes_empty_on_failure() {
        let mut j = job();
        let mut pool = vec![
            CandidateProfile {
                first_name: "Rusty".to_string(),
                skills: vec!["Rust".to_string()],
                ..Default::default()
            },
            CandidateProfile {
                first_name: "Chef".to_string(),
                skills: vec!["Baking".to_string()],
                ..Default::default()
            },
            CandidateProfile {
                first_name: "Preset".to_string(),
                embedding: Some(vec![0.5, -0.5, 0.1]),
                ..Default::default()
            },
        ];

        fill_missing_embeddings(&PickyEmbedder, &mut j, &mut pool, 4).await;

        assert_eq!(j.embedding, Some(vec![0.2, -0.1, 0.3]));
        assert_eq!(pool[0].embedding, Some(vec![0.2, -0.1, 0.3]));
        assert_eq!(pool[1].embedding, Some(vec![]));
        assert_eq!(pool[2].embedding, Some(vec![0.5, -0.5, 0.1]));

        let ranked = HybridScorer.rank(&j, &pool);
        let method = |n: &str| {
            ranked
                .iter()
                .find(|s| s.candidate.first_name == n)
                .map(|s| s.score_method)
        };
        assert_eq!(method("Rusty"), Some(ScoreMethod::Vector));
        assert_eq!(method("Chef"), Some(ScoreMethod::Keyword));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_missing_embeddings_bounds_in_flight_requests() {
        let embedder = CountingEmbedder::default();
        let mut j = job();
        j.embedding = Some(vec![0.1, -0.2, 0.3]);
        let mut pool = acme_pool(500);

        fill_missing_embeddings(&embedder, &mut j, &mut pool, 8).await;

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 500);
        assert_eq!(embedder.peak.load(Ordering::SeqCst), 8);
        assert!(pool.iter().all(|c| c.embedding.as_deref() == Some(&[0.2, -0.1, 0.3][..])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_missing_embeddings_zero_concurrency_still_runs() {
        let embedder = CountingEmbedder::default();
        let mut j = job();
        let mut pool = acme_pool(3);

        fill_missing_embeddings(&embedder, &mut j, &mut pool, 0).await;

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
        assert_eq!(embedder.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_options_default_from_empty_json() {
        let options: MatchOptions = serde_json::from_str("{}").unwrap();
        assert!(options.diversify);
        assert_eq!(options.deep_match_top, 0);
        assert!(!options.embed_missing);
        assert!(options.limit.is_none());
    }
}
