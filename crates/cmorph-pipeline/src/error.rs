//! Pipeline error types.

use thiserror::Error;

use cmorph_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Run-level errors.
///
/// Ingestion and per-job failures are recovered locally (logged, counted,
/// excluded) and never surface here; only errors that make the run itself
/// unusable do.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("insufficient candidates: {0} usable (need at least 2)")]
    InsufficientCandidates(usize),

    #[error("all {0} interpolation jobs failed")]
    NoSuccessfulJobs(usize),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check whether the error is one of the run-fatal kinds, as opposed
    /// to an environment or IO problem.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InsufficientCandidates(_) | PipelineError::NoSuccessfulJobs(_)
        )
    }
}
