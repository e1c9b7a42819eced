//! Candidate images considered for a sequence.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single still image considered for inclusion in the output sequence.
///
/// Built once when the input directory is scanned; the `embedding` and
/// `valid` fields are the only ones mutated afterwards (embedding is
/// populated lazily, validity flips off when the image fails quality
/// screening or embedding).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Candidate {
    /// Source image path
    pub path: PathBuf,

    /// Fraction of pixels considered opaque (1.0 for images without alpha)
    pub foreground_ratio: f32,

    /// Normalized feature vector, populated by the embedding index builder.
    /// Derived data, not part of the serialized record.
    #[serde(skip)]
    #[schemars(skip)]
    pub embedding: Option<Vec<f32>>,

    /// Whether the candidate is still eligible for selection
    pub valid: bool,

    /// Why the candidate was rejected, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
}

impl Candidate {
    /// Create a valid candidate with a measured foreground ratio.
    pub fn new(path: impl Into<PathBuf>, foreground_ratio: f32) -> Self {
        Self {
            path: path.into(),
            foreground_ratio,
            embedding: None,
            valid: true,
            reject_reason: None,
        }
    }

    /// Create a candidate already rejected at ingestion.
    pub fn rejected(path: impl Into<PathBuf>, foreground_ratio: f32, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            foreground_ratio,
            embedding: None,
            valid: false,
            reject_reason: Some(reason.into()),
        }
    }

    /// Mark the candidate invalid, recording why.
    pub fn invalidate(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.reject_reason = Some(reason.into());
    }

    /// Source file name, lossy-decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
