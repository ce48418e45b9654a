//! Vector retrieval
//!
//! Embeds a query, asks a deployed nearest-neighbor index for the closest
//! datapoints, and resolves each datapoint id to its snippet text. Used to
//! augment section prompts with context from pitch decks, maturity models,
//! and benchmark material.

use crate::error::ReportError;
use crate::models::RetrievalMatch;
use crate::openai::Embedder;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, warn};

/// One raw nearest-neighbor hit, text not yet resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub datapoint_id: String,
    pub distance: f32,
}

/// Nearest-neighbor index backend.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn find_neighbors(&self, vector: &[f32], top_k: usize) -> crate::Result<Vec<Neighbor>>;
}

/// Resolves a datapoint id to its original snippet text.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    async fn lookup(&self, datapoint_id: &str) -> Option<String>;
}

/// Thin client for a deployed nearest-neighbor index endpoint.
pub struct NeighborHttpIndex {
    client: Client,
    endpoint_resource_name: String,
    deployed_index_id: String,
}

impl NeighborHttpIndex {
    pub fn new(endpoint_resource_name: String, deployed_index_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint_resource_name,
            deployed_index_id,
        }
    }
}

#[async_trait]
impl VectorIndex for NeighborHttpIndex {
    async fn find_neighbors(&self, vector: &[f32], top_k: usize) -> crate::Result<Vec<Neighbor>> {
        let url = format!("{}:findNeighbors", self.endpoint_resource_name);

        let request = FindNeighborsRequest {
            deployed_index_id: self.deployed_index_id.clone(),
            query_vector: vector.to_vec(),
            neighbor_count: top_k,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Nearest-neighbor request failed: {}", e);
                ReportError::RetrievalError(format!("Index query error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Nearest-neighbor error response ({}): {}", status, error_text);
            return Err(ReportError::RetrievalError(format!(
                "Index query error ({}): {}",
                status, error_text
            )));
        }

        let parsed: FindNeighborsResponse = response.json().await.map_err(|e| {
            ReportError::RetrievalError(format!("Index response parse error: {}", e))
        })?;

        Ok(parsed.neighbors)
    }
}

/// In-memory datapoint-id → text mapping, loadable after indexing.
pub struct InMemorySnippetStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySnippetStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn load(&self, mapping: HashMap<String, String>) {
        let mut entries = self.entries.write().await;
        *entries = mapping;
    }

    pub async fn insert(&self, datapoint_id: impl Into<String>, text: impl Into<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(datapoint_id.into(), text.into());
    }
}

impl Default for InMemorySnippetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnippetStore for InMemorySnippetStore {
    async fn lookup(&self, datapoint_id: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(datapoint_id).cloned()
    }
}

/// Retrieval client: embed → match → resolve text → sort by distance.
pub struct RetrievalClient {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    snippets: Arc<dyn SnippetStore>,
}

impl RetrievalClient {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        snippets: Arc<dyn SnippetStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            snippets,
        }
    }

    /// Retrieve the `top_k` closest snippets for a query.
    ///
    /// Backend unavailability is degraded input, not a failure: embedding or
    /// index errors log a warning and yield an empty result. A datapoint id
    /// with no stored text resolves to a placeholder snippet.
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> Vec<RetrievalMatch> {
        let vector = match self.embedder.embed(query_text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Query embedding failed, skipping retrieval: {}", e);
                return Vec::new();
            }
        };

        let neighbors = match self.index.find_neighbors(&vector, top_k).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!("Nearest-neighbor search failed, skipping retrieval: {}", e);
                return Vec::new();
            }
        };

        let mut matches = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let content = self
                .snippets
                .lookup(&neighbor.datapoint_id)
                .await
                .unwrap_or_else(|| format!("[No text found for ID: {}]", neighbor.datapoint_id));

            matches.push(RetrievalMatch {
                datapoint_id: neighbor.datapoint_id,
                content,
                distance: neighbor.distance,
            });
        }

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches
    }
}

/// Format matches into a prompt-ready context block.
pub fn build_context_from_matches(matches: &[RetrievalMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }

    let snippets: Vec<String> = matches
        .iter()
        .map(|m| {
            format!(
                "ID: {}\nDistance: {}\nContent:\n{}\n",
                m.datapoint_id, m.distance, m.content
            )
        })
        .collect();

    format!("Relevant Context:\n{}", snippets.join("\n---\n"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindNeighborsRequest {
    deployed_index_id: String,
    query_vector: Vec<f32>,
    neighbor_count: usize,
}

#[derive(Debug, Deserialize)]
struct FindNeighborsResponse {
    #[serde(default)]
    neighbors: Vec<Neighbor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> crate::Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> crate::Result<Vec<f32>> {
            Err(ReportError::EmbeddingError("backend down".to_string()))
        }
    }

    struct FixedIndex {
        neighbors: Vec<Neighbor>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn find_neighbors(
            &self,
            _vector: &[f32],
            top_k: usize,
        ) -> crate::Result<Vec<Neighbor>> {
            Ok(self.neighbors.iter().take(top_k).cloned().collect())
        }
    }

    fn neighbor(id: &str, distance: f32) -> Neighbor {
        Neighbor {
            datapoint_id: id.to_string(),
            distance,
        }
    }

    #[tokio::test]
    async fn test_retrieve_sorts_by_ascending_distance() {
        let snippets = InMemorySnippetStore::new();
        snippets.insert("far", "far text").await;
        snippets.insert("near", "near text").await;

        let client = RetrievalClient::new(
            Arc::new(FixedEmbedder),
            Arc::new(FixedIndex {
                neighbors: vec![neighbor("far", 0.9), neighbor("near", 0.1)],
            }),
            Arc::new(snippets),
        );

        let matches = client.retrieve("query", 5).await;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].datapoint_id, "near");
        assert_eq!(matches[1].datapoint_id, "far");
    }

    #[tokio::test]
    async fn test_missing_snippet_resolves_to_placeholder() {
        let client = RetrievalClient::new(
            Arc::new(FixedEmbedder),
            Arc::new(FixedIndex {
                neighbors: vec![neighbor("ghost", 0.5)],
            }),
            Arc::new(InMemorySnippetStore::new()),
        );

        let matches = client.retrieve("query", 5).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content, "[No text found for ID: ghost]");
    }

    #[tokio::test]
    async fn test_embedder_failure_degrades_to_empty() {
        let client = RetrievalClient::new(
            Arc::new(FailingEmbedder),
            Arc::new(FixedIndex { neighbors: vec![] }),
            Arc::new(InMemorySnippetStore::new()),
        );

        let matches = client.retrieve("query", 5).await;
        assert!(matches.is_empty());
    }

    #[test]
    fn test_build_context_block_format() {
        let matches = vec![RetrievalMatch {
            datapoint_id: "doc1_page0".to_string(),
            content: "ACME grew revenue 20% last year.".to_string(),
            distance: 0.12,
        }];

        let block = build_context_from_matches(&matches);
        assert!(block.starts_with("Relevant Context:"));
        assert!(block.contains("ID: doc1_page0"));
        assert!(block.contains("ACME grew revenue 20% last year."));
    }

    #[test]
    fn test_build_context_empty_matches() {
        assert_eq!(build_context_from_matches(&[]), "");
    }
}
