//! Embedding client — OpenAI-compatible `/v1/embeddings` with an optional
//! Redis read-through cache keyed on model + SHA-256 of the input text.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::LlmError;

/// Remote embedding. A failure is reported as an error; callers that feed the
/// ranking engine go through [`embed_or_empty`].
#[async_trait]
pub trait EmbeddingSource: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

/// Embeds `text`, substituting an empty vector on failure. Never random values:
/// an empty vector routes the comparison to keyword scoring.
pub async fn embed_or_empty(source: &dyn EmbeddingSource, text: &str) -> Vec<f32> {
    match source.embed(text).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!("Embedding failed, falling back to empty vector: {e}");
            Vec::new()
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Shares one multiplexed Redis connection across every call; clones are
/// handles onto the same socket.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    cache: Option<MultiplexedConnection>,
}

impl EmbeddingClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        cache: Option<MultiplexedConnection>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_url,
            api_key,
            model,
            cache,
        })
    }

    async fn fetch(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut request = self.client.post(&self.api_url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    async fn cached(&self, key: &str) -> Option<Vec<f32>> {
        let mut conn = self.cache.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Redis get error for key {key}: {e}");
                None
            }
        }
    }

    async fn store(&self, key: &str, vector: &[f32]) {
        let Some(mut conn) = self.cache.clone() else {
            return;
        };
        let payload = match serde_json::to_string(vector) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialise embedding for cache: {e}");
                return;
            }
        };
        if let Err(e) = conn.set::<_, _, ()>(key, payload).await {
            warn!("Failed to cache embedding in Redis: {e}");
        }
    }
}

#[async_trait]
impl EmbeddingSource for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let key = cache_key(&self.model, text);

        if let Some(vector) = self.cached(&key).await {
            debug!("Embedding cache hit: {key}");
            return Ok(vector);
        }

        let vector = self.fetch(text).await?;
        self.store(&key, &vector).await;
        Ok(vector)
    }
}

fn cache_key(model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("embedding:{}:{}", model, hex::encode(hasher.finalize()))
}
