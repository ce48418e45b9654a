//! Error types for the diligence report orchestrator

use thiserror::Error;

/// Result type alias for report pipeline operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Missing template placeholder: {0}")]
    MissingPlaceholder(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Report not found: {0}")]
    ReportNotFound(uuid::Uuid),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReportError {
    /// Contract errors indicate a caller defect (a prompt template invoked
    /// with an incomplete context mapping). They must surface to the caller
    /// unretried; everything else is a service failure the pipeline absorbs.
    pub fn is_contract_error(&self) -> bool {
        matches!(self, ReportError::MissingPlaceholder(_))
    }
}
