//! Runtime configuration
//!
//! Read once from the environment at startup and passed by reference into
//! the orchestrator and every collaborator. No module-level globals.

use std::env;
use std::time::Duration;

/// Vector retrieval is optional: both identifiers must be present for the
/// retrieval step to run at all.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Full resource name of the deployed index endpoint.
    pub endpoint_resource_name: String,
    /// ID assigned when the index was deployed to the endpoint.
    pub deployed_index_id: String,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub embedding_model: String,
    pub retrieval: Option<RetrievalConfig>,
    /// Minimum spacing between text-generation calls (quota control).
    pub section_delay: Duration,
    /// Concurrent text-generation calls allowed per process.
    pub max_concurrent_generations: usize,
    pub retry_max_attempts: u32,
    pub retry_delay: Duration,
    pub database_url: Option<String>,
    pub bucket: Option<BucketConfig>,
    pub api_port: u16,
}

impl AppConfig {
    /// Load configuration from the environment. Absent retrieval or storage
    /// settings disable those steps rather than failing startup.
    pub fn from_env() -> Self {
        let retrieval = match (
            non_empty_var("VERTEX_ENDPOINT_RESOURCE_NAME"),
            non_empty_var("VERTEX_DEPLOYED_INDEX_ID"),
        ) {
            (Some(endpoint_resource_name), Some(deployed_index_id)) => Some(RetrievalConfig {
                endpoint_resource_name,
                deployed_index_id,
                top_k: parse_var("RETRIEVAL_TOP_K", 5),
            }),
            _ => None,
        };

        let bucket = match (
            non_empty_var("STORAGE_URL"),
            non_empty_var("STORAGE_SERVICE_KEY"),
        ) {
            (Some(base_url), Some(service_key)) => Some(BucketConfig {
                base_url,
                service_key,
                bucket: non_empty_var("STORAGE_BUCKET").unwrap_or_else(|| "reports".to_string()),
            }),
            _ => None,
        };

        Self {
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: non_empty_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            embedding_model: non_empty_var("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            retrieval,
            section_delay: Duration::from_secs(parse_var("SECTION_DELAY_SECS", 90)),
            max_concurrent_generations: parse_var("MAX_CONCURRENT_GENERATIONS", 2),
            retry_max_attempts: parse_var("RETRY_MAX_ATTEMPTS", 3),
            retry_delay: Duration::from_secs(parse_var("RETRY_DELAY_SECS", 2)),
            database_url: non_empty_var("DATABASE_URL").or_else(|| non_empty_var("POSTGRES_URL")),
            bucket,
            api_port: parse_var("PORT", 8080),
        }
    }
}

impl Default for AppConfig {
    /// Defaults suitable for tests and local demos: no retrieval, no
    /// external storage, zero pacing is NOT assumed (tests opt in via the
    /// rate limiter's unthrottled mode).
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model: "gpt-4".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            retrieval: None,
            section_delay: Duration::from_secs(90),
            max_concurrent_generations: 2,
            retry_max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            database_url: None,
            bucket: None,
            api_port: 8080,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.retrieval.is_none());
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.section_delay, Duration::from_secs(90));
    }
}
