//! Deep Qualitative Matcher — best-effort LLM review of a single candidate.
//!
//! This is a decoration on top of the deterministic ranking, never a
//! dependency of it: every failure mode (remote error, timeout, malformed
//! JSON) collapses into a zero score with a fallback reasoning string.
//!
//! `AppState` holds an `Arc<dyn Enricher>`; tests swap in a fake
//! `TextGenerationSource` instead of mocking HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmError, TextGenerationSource};
use crate::matching::prompts::{DEEP_MATCH_PROMPT_TEMPLATE, DEEP_MATCH_SYSTEM};
use crate::matching::types::{CandidateProfile, JobDescriptor, ScoredCandidate};

pub const MAX_PROFILE_SKILLS: usize = 15;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 800;
pub const FALLBACK_REASONING: &str =
    "Qualitative review unavailable; rely on the deterministic match score.";

/// Result of one qualitative review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepMatch {
    pub score: u8,
    pub reasoning: String,
}

impl DeepMatch {
    pub fn fallback() -> Self {
        Self {
            score: 0,
            reasoning: FALLBACK_REASONING.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeepMatchError {
    #[error("remote call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("no JSON object in response")]
    MissingJson,

    #[error("malformed deep-match JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("score is not a finite number")]
    InvalidScore,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Effectful enrichment of one candidate. Implementations must not fail:
/// errors are converted to [`DeepMatch::fallback`].
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn deep_match(&self, job: &JobDescriptor, candidate: &CandidateProfile) -> DeepMatch;
}

/// LLM-backed enricher issuing one generation request per candidate.
pub struct DeepQualitativeMatcher {
    source: Arc<dyn TextGenerationSource>,
    timeout: Option<Duration>,
}

impl DeepQualitativeMatcher {
    pub fn new(source: Arc<dyn TextGenerationSource>) -> Self {
        Self {
            source,
            timeout: None,
        }
    }

    /// Per-call timeout. A timeout is handled exactly like a parse failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn try_deep_match(
        &self,
        job: &JobDescriptor,
        candidate: &CandidateProfile,
    ) -> Result<DeepMatch, DeepMatchError> {
        let prompt = build_deep_match_prompt(job, candidate);
        let system = format!("{DEEP_MATCH_SYSTEM} {JSON_ONLY_SYSTEM}");
        let call = self.source.generate(&system, &prompt);

        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| DeepMatchError::Timeout(limit))??,
            None => call.await?,
        };

        parse_deep_match(&text)
    }
}

#[async_trait]
impl Enricher for DeepQualitativeMatcher {
    async fn deep_match(&self, job: &JobDescriptor, candidate: &CandidateProfile) -> DeepMatch {
        match self.try_deep_match(job, candidate).await {
            Ok(result) => {
                debug!(
                    "Deep match for {}: {}/100",
                    candidate.full_name(),
                    result.score
                );
                result
            }
            Err(e) => {
                warn!("Deep match failed for {}: {e}", candidate.full_name());
                DeepMatch::fallback()
            }
        }
    }
}

/// Runs `deep_match` concurrently for the first `top_n` entries and writes
/// `deep_score` and `reasoning` back. Order and `match_score` are untouched.
/// Returns the number of entries reviewed.
pub async fn enrich_top(
    enricher: &dyn Enricher,
    job: &JobDescriptor,
    ranked: &mut [ScoredCandidate],
    top_n: usize,
) -> usize {
    let count = top_n.min(ranked.len());
    if count == 0 {
        return 0;
    }

    let reviews = join_all(
        ranked[..count]
            .iter()
            .map(|scored| enricher.deep_match(job, &scored.candidate)),
    )
    .await;

    for (scored, review) in ranked.iter_mut().zip(reviews) {
        scored.deep_score = Some(review.score);
        scored.reasoning = Some(review.reasoning);
    }

    count
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building and response parsing
// ────────────────────────────────────────────────────────────────────────────

fn build_deep_match_prompt(job: &JobDescriptor, candidate: &CandidateProfile) -> String {
    let profile = lean_profile(candidate);
    fill_template(
        DEEP_MATCH_PROMPT_TEMPLATE,
        &[
            ("{job_title}", job.title.as_str()),
            (
                "{job_description}",
                truncate_chars(&job.description, MAX_JOB_DESCRIPTION_CHARS),
            ),
            ("{candidate_profile}", profile.as_str()),
        ],
    )
}

/// Single left-to-right pass over `template`. Substituted values are never
/// rescanned, so placeholder text inside user input stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Compact profile text: only what the reviewer needs, skills capped.
fn lean_profile(candidate: &CandidateProfile) -> String {
    let skills: Vec<&str> = candidate
        .skills
        .iter()
        .take(MAX_PROFILE_SKILLS)
        .map(String::as_str)
        .collect();

    let mut lines = vec![
        format!("Name: {}", candidate.full_name()),
        format!("Current title: {}", or_unknown(&candidate.current_title)),
        format!("Current company: {}", or_unknown(&candidate.current_company)),
        format!("Skills: {}", if skills.is_empty() { "none listed".to_string() } else { skills.join(", ") }),
    ];
    if let Some(months) = candidate.total_experience_months {
        lines.push(format!("Experience: {} years {} months", months / 12, months % 12));
    }
    if let Some(location) = &candidate.location {
        lines.push(format!("Location: {}, {}", location.city, location.country));
    }
    lines.join("\n")
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct RawDeepMatch {
    score: f64,
    #[serde(default)]
    reasoning: String,
}

/// Parses the first JSON object in `text`, tolerating surrounding prose or
/// code fences, and clamps the score to [0, 100].
fn parse_deep_match(text: &str) -> Result<DeepMatch, DeepMatchError> {
    let start = text.find('{').ok_or(DeepMatchError::MissingJson)?;
    let raw: RawDeepMatch = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<RawDeepMatch>()
        .next()
        .ok_or(DeepMatchError::MissingJson)??;

    if !raw.score.is_finite() {
        return Err(DeepMatchError::InvalidScore);
    }

    Ok(DeepMatch {
        score: raw.score.round().clamp(0.0, 100.0) as u8,
        reasoning: raw.reasoning.trim().to_string(),
    })
}
