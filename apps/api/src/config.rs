use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub anthropic_api_key: String,
    /// Tried in order after the primary model keeps failing.
    pub llm_fallback_models: Vec<String>,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    /// Maximum embedding requests in flight while filling a candidate pool.
    pub embedding_concurrency: usize,
    pub deep_match_timeout_secs: u64,
    /// Upper bound on `deepMatchTop` accepted from requests.
    pub deep_match_max_top: usize,
    /// Upper bound on candidates loaded per stored-job match.
    pub max_pool_size: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_fallback_models: parse_list(
                &std::env::var("LLM_FALLBACK_MODELS")
                    .unwrap_or_else(|_| "claude-haiku-4-5".to_string()),
            ),
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY").ok(),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_concurrency: parse_env::<usize>("EMBEDDING_CONCURRENCY", 8)?.max(1),
            deep_match_timeout_secs: parse_env("DEEP_MATCH_TIMEOUT_SECS", 20)?,
            deep_match_max_top: parse_env("DEEP_MATCH_MAX_TOP", 10)?,
            max_pool_size: parse_env("MAX_POOL_SIZE", 5000)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_list(" claude-haiku-4-5, ,claude-3-5-haiku ,"),
            vec!["claude-haiku-4-5", "claude-3-5-haiku"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("MATCHER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_negative_pool_size() {
        std::env::set_var("MATCHER_TEST_NEGATIVE_POOL", "-5");
        let result = parse_env::<u32>("MATCHER_TEST_NEGATIVE_POOL", 5000);
        std::env::remove_var("MATCHER_TEST_NEGATIVE_POOL");
        assert!(result.is_err());
    }
}
