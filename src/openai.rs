//! OpenAI API client for text generation and embeddings
//!
//! Provides the chat-completion backend behind every section agent and the
//! embedding backend behind retrieval.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::ReportError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// One chat turn submitted to the text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Text-generation backend: an ordered list of chat turns in, raw text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String>;
}

/// Embedding backend: text in, fixed-dimension vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>>;
}

/// Reusable OpenAI client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, embedding_model: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
            embedding_model,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Override the API base URL (local gateways, test doubles).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(ReportError::LlmError(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
        };

        info!(model = %self.model, "Calling chat completion API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                ReportError::LlmError(format!("Chat completion error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Chat completion error response ({}): {}", status, error_text);
            return Err(ReportError::LlmError(format!(
                "Chat completion error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completion response: {}", e);
            ReportError::LlmError(format!("Chat completion parse error: {}", e))
        })?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| {
                ReportError::LlmError("Empty response from chat completion API".to_string())
            })?;

        Ok(content)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        if self.api_key.is_empty() {
            return Err(ReportError::EmbeddingError(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Embedding request failed: {}", e);
                ReportError::EmbeddingError(format!("Embedding error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Embedding error response ({}): {}", status, error_text);
            return Err(ReportError::EmbeddingError(format!(
                "Embedding error ({}): {}",
                status, error_text
            )));
        }

        let embedding: EmbeddingResponse = response.json().await.map_err(|e| {
            ReportError::EmbeddingError(format!("Embedding parse error: {}", e))
        })?;

        embedding
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                ReportError::EmbeddingError("Empty embedding response".to_string())
            })
    }
}

/// Mock generator for development & testing.
/// Keeps the pipeline functional without LLM dependency.
pub struct MockTextGenerator {
    response: String,
}

impl MockTextGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(&self, _messages: &[ChatMessage]) -> crate::Result<String> {
        Ok(self.response.clone())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![
                ChatMessage::system("You are an expert report writer."),
                ChatMessage::user("Draft the market section."),
            ],
        };

        let json = serde_json::to_string(&request);
        assert!(json.is_ok());
        let json = json.unwrap();
        assert!(json.contains("Draft the market section."));
        assert!(json.contains("\"role\":\"system\""));
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  section text  "}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "  section text  ");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = OpenAiClient::new(String::new(), "gpt-4".into(), "ada".into());
        let result = client.complete(&[ChatMessage::user("hi")]).await;
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.to_lowercase().contains("api_key not configured"));
    }
}
