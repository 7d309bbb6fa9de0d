use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::embedding::EmbeddingSource;
use crate::matching::deep_match::Enricher;
use crate::matching::ranking::Scorer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Remote collaborators are passed in here rather than reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub embedder: Arc<dyn EmbeddingSource>,
    /// Pure ranking backend. Default: HybridScorer.
    pub scorer: Arc<dyn Scorer>,
    /// Best-effort qualitative reviewer. Default: DeepQualitativeMatcher.
    pub enricher: Arc<dyn Enricher>,
}
