//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::{fetch_candidate_pool, fetch_job};
use crate::errors::AppError;
use crate::matching::pipeline::{fill_missing_embeddings, run_match, MatchOptions, MatchOutcome};
use crate::matching::types::{CandidateProfile, JobDescriptor, ScoredCandidate};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub job: JobDescriptor,
    #[serde(default)]
    pub candidates: Vec<CandidateProfile>,
    #[serde(default)]
    pub options: MatchOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobMatchRequest {
    #[serde(default)]
    pub options: MatchOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub results: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    pub diversified: bool,
    pub enriched: usize,
    pub scorer_backend: String,
}

impl MatchResponse {
    fn from_outcome(outcome: MatchOutcome, scorer_backend: &str) -> Self {
        Self {
            results: outcome.results,
            total_candidates: outcome.total_candidates,
            diversified: outcome.diversified,
            enriched: outcome.enriched,
            scorer_backend: scorer_backend.to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Scores an inline job and candidate pool. Nothing is read from or written to the DB.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let MatchRequest {
        mut job,
        mut candidates,
        options,
    } = request;
    validate_job(&job)?;

    if options.embed_missing {
        fill_missing_embeddings(
            state.embedder.as_ref(),
            &mut job,
            &mut candidates,
            state.config.embedding_concurrency,
        )
        .await;
    }

    let outcome = run_match(
        state.scorer.as_ref(),
        state.enricher.as_ref(),
        &job,
        &candidates,
        &options,
        state.config.deep_match_max_top,
    )
    .await;

    Ok(Json(MatchResponse::from_outcome(
        outcome,
        state.scorer.backend(),
    )))
}

/// POST /api/v1/jobs/:id/match
///
/// Loads a stored job and its organisation's candidate pool, then ranks it.
pub async fn handle_job_match(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(request): Json<JobMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let job_row = fetch_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let rows = fetch_candidate_pool(&state.db, job_row.organization_id, state.config.max_pool_size).await?;
    info!("Loaded {} candidates for job {}", rows.len(), job_id);

    let mut job: JobDescriptor = job_row.into();
    validate_job(&job)?;
    let mut candidates: Vec<CandidateProfile> = rows.into_iter().map(Into::into).collect();

    if request.options.embed_missing {
        fill_missing_embeddings(
            state.embedder.as_ref(),
            &mut job,
            &mut candidates,
            state.config.embedding_concurrency,
        )
        .await;
    }

    let outcome = run_match(
        state.scorer.as_ref(),
        state.enricher.as_ref(),
        &job,
        &candidates,
        &request.options,
        state.config.deep_match_max_top,
    )
    .await;

    Ok(Json(MatchResponse::from_outcome(
        outcome,
        state.scorer.backend(),
    )))
}

fn validate_job(job: &JobDescriptor) -> Result<(), AppError> {
    if job.title.trim().is_empty() && job.description.trim().is_empty() {
        return Err(AppError::Validation(
            "job must have a title or a description".to_string(),
        ));
    }
    Ok(())
}
