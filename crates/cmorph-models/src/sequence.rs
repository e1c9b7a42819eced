//! Sequence selection strategies and the sequence manifest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How the ordered subset of candidates is chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Walk to the unvisited candidate most similar to the last chosen one
    #[default]
    Greedy,
    /// Trade local similarity for spread across the embedding space
    Balanced,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::Greedy => "greedy",
            SelectionStrategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Error)]
#[error("unknown selection strategy: {0}")]
pub struct ParseStrategyError(pub String);

impl FromStr for SelectionStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(SelectionStrategy::Greedy),
            "balanced" => Ok(SelectionStrategy::Balanced),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// One selected image in the sequence manifest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SequenceEntry {
    /// Position in the chosen sequence
    pub index: usize,

    /// Source file name
    pub source: String,

    /// Path of the copied sequence frame
    pub path: String,
}

/// Manifest written next to the copied sequence stills.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SequenceManifest {
    /// Character the sequence belongs to
    pub character: String,

    /// Selection strategy name
    pub method: String,

    /// Candidate pool size before selection
    pub total_images: usize,

    /// Number of images chosen
    pub selected_count: usize,

    /// Selected images in order
    pub images: Vec<SequenceEntry>,
}
