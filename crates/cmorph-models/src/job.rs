//! Interpolation jobs and run identifiers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::InterpolationParams;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome state of an interpolation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Not yet dispatched to the engine
    #[default]
    Pending,
    /// Engine produced the expected frames
    Success,
    /// Engine error or timeout; the pair contributes no frames
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

/// One interpolation engine invocation for a consecutive pair in the
/// chosen sequence.
///
/// Created `Pending` before dispatch and transitioned exactly once, to
/// `Success` or `Failed`, after the engine call resolves.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InterpolationJob {
    /// Position of the pair in the sequence (job i spans images i and i+1)
    pub pair_index: usize,

    /// First endpoint image
    pub image_a: PathBuf,

    /// Second endpoint image
    pub image_b: PathBuf,

    /// Engine parameters for this pair
    pub params: InterpolationParams,

    /// Outcome state
    #[serde(default)]
    pub status: JobStatus,

    /// Frames collected from the engine output directory, in order
    #[serde(default)]
    pub produced_frames: Vec<PathBuf>,

    /// Engine error or timeout message, when the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock time spent resolving this job
    #[serde(default)]
    pub elapsed_ms: u64,

    /// When the job resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl InterpolationJob {
    /// Create a pending job for one consecutive pair.
    pub fn new(
        pair_index: usize,
        image_a: impl Into<PathBuf>,
        image_b: impl Into<PathBuf>,
        params: InterpolationParams,
    ) -> Self {
        Self {
            pair_index,
            image_a: image_a.into(),
            image_b: image_b.into(),
            params,
            status: JobStatus::Pending,
            produced_frames: Vec::new(),
            error: None,
            elapsed_ms: 0,
            resolved_at: None,
        }
    }

    /// Resolve the job as successful with its ordered frames.
    pub fn succeed(&mut self, frames: Vec<PathBuf>, elapsed_ms: u64) {
        debug_assert!(!self.status.is_terminal(), "job resolved twice");
        self.status = JobStatus::Success;
        self.produced_frames = frames;
        self.elapsed_ms = elapsed_ms;
        self.resolved_at = Some(Utc::now());
    }

    /// Resolve the job as failed with the engine error.
    pub fn fail(&mut self, error: impl Into<String>, elapsed_ms: u64) {
        debug_assert!(!self.status.is_terminal(), "job resolved twice");
        self.status = JobStatus::Failed;
        self.produced_frames = Vec::new();
        self.error = Some(error.into());
        self.elapsed_ms = elapsed_ms;
        self.resolved_at = Some(Utc::now());
    }

    /// Frames this job collected (zero when failed or pending).
    pub fn frame_count(&self) -> usize {
        self.produced_frames.len()
    }
}
