//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur at the media boundary.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("interpolation engine not found: {0}")]
    EngineNotFound(String),

    #[error("embedding binary not found: {0}")]
    EmbedderNotFound(String),

    #[error("interpolation engine failed: {message}")]
    EngineFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("engine produced {found} frames, expected {expected}")]
    MissingFrames { expected: usize, found: usize },

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("unreadable image: {0}")]
    UnreadableImage(PathBuf),

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an engine failure error.
    pub fn engine_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EngineFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an embedding failure error.
    pub fn embedding_failed(message: impl Into<String>) -> Self {
        Self::EmbeddingFailed(message.into())
    }

    /// Create an invalid-embedding error.
    pub fn invalid_embedding(message: impl Into<String>) -> Self {
        Self::InvalidEmbedding(message.into())
    }

    /// Check if the error is a per-job timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MediaError::Timeout(_))
    }
}
