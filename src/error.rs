//! Error types for Pagewright
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Pagewright
#[derive(Debug, Error)]
pub enum PagewrightError {
    /// Invalid engine configuration (caught before any generation call)
    #[error("Config error: {0}")]
    Config(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Trace storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Pagewright operations
pub type Result<T> = std::result::Result<T, PagewrightError>;
