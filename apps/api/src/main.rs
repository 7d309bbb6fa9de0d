mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::embedding::EmbeddingClient;
use crate::llm_client::LlmClient;
use crate::matching::deep_match::DeepQualitativeMatcher;
use crate::matching::ranking::HybridScorer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matcher API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (embedding cache only). One multiplexed connection is
    // shared by every request; without it embeddings are simply not cached.
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = match redis.get_multiplexed_async_connection().await {
        Ok(conn) => {
            info!("Redis connection established");
            Some(conn)
        }
        Err(e) => {
            warn!("Redis unavailable, embedding cache disabled: {e}");
            None
        }
    };

    // Initialize remote model clients
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_fallback_models.clone(),
    )?;
    info!("LLM client initialized (models: {:?})", llm.models());

    let embedder = EmbeddingClient::new(
        config.embedding_api_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
        cache,
    )?;
    info!(
        "Embedding client initialized (model: {}, concurrency: {})",
        config.embedding_model, config.embedding_concurrency
    );

    let enricher = DeepQualitativeMatcher::new(Arc::new(llm))
        .with_timeout(Duration::from_secs(config.deep_match_timeout_secs));

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        embedder: Arc::new(embedder),
        scorer: Arc::new(HybridScorer),
        enricher: Arc::new(enricher),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
