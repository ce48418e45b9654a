//! Object storage for rendered report documents
//!
//! Thin upload + signed-URL wrapper over a bucket storage REST surface,
//! with an in-memory store for tests and demos.

use crate::config::BucketConfig;
use crate::error::ReportError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Object storage collaborator.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> crate::Result<()>;
    /// Time-limited download URL for an uploaded object.
    async fn signed_url(&self, path: &str, expires_in: Duration) -> crate::Result<String>;
}

/// Bucket storage client over a Supabase-style REST surface.
pub struct BucketHttpStore {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl BucketHttpStore {
    pub fn new(config: &BucketConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for BucketHttpStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> crate::Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        info!(bucket = %self.bucket, path, "Uploading report document");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                error!("Document upload failed: {}", e);
                ReportError::StorageError(format!("Upload error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Document upload error response ({}): {}", status, error_text);
            return Err(ReportError::StorageError(format!(
                "Upload error ({}): {}",
                status, error_text
            )));
        }

        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in: Duration) -> crate::Result<String> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        );

        let request = SignRequest {
            expires_in: expires_in.as_secs(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReportError::StorageError(format!("Sign error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReportError::StorageError(format!(
                "Sign error ({}): {}",
                status, error_text
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| ReportError::StorageError(format!("Sign response parse error: {}", e)))?;

        Ok(format!(
            "{}/storage/v1{}",
            self.base_url,
            signed.signed_url.trim_start_matches("/storage/v1")
        ))
    }
}

/// In-memory object store for tests and local demos.
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, (Vec<u8>, String)>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        let objects = self.objects.read().await;
        objects.get(path).map(|(bytes, _)| bytes.clone())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> crate::Result<()> {
        let mut objects = self.objects.write().await;
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in: Duration) -> crate::Result<String> {
        let objects = self.objects.read().await;
        if !objects.contains_key(path) {
            return Err(ReportError::StorageError(format!(
                "No stored object at {}",
                path
            )));
        }
        Ok(format!(
            "memory://{}?expires_in={}",
            path,
            expires_in.as_secs()
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Storage path for a report's rendered document.
pub fn document_path(company: &str, report_id: uuid::Uuid, extension: &str) -> String {
    let slug: String = company
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("reports/{}_{}.{}", slug, report_id, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_upload_and_sign() {
        let store = InMemoryObjectStore::new();
        store
            .upload("reports/acme.html", b"<html></html>".to_vec(), "text/html")
            .await
            .unwrap();

        let url = store
            .signed_url("reports/acme.html", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.contains("reports/acme.html"));
        assert!(url.contains("3600"));

        assert_eq!(store.get("reports/acme.html").await.unwrap(), b"<html></html>");
    }

    #[tokio::test]
    async fn test_sign_unknown_object_errors() {
        let store = InMemoryObjectStore::new();
        let result = store
            .signed_url("reports/ghost.html", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(ReportError::StorageError(_))));
    }

    #[test]
    fn test_document_path_slugs_company_name() {
        let id = uuid::Uuid::nil();
        let path = document_path("Acme & Co", id, "html");
        assert!(path.starts_with("reports/Acme___Co_"));
        assert!(path.ends_with(".html"));
    }
}
