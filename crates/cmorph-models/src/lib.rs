//! Shared data models for the CharMorph animation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Candidates and their quality/embedding state
//! - Interpolation parameters and alpha handling modes
//! - Interpolation jobs and run identifiers
//! - Sequence selection strategies and manifests
//! - Animation metadata and the durable run manifest

pub mod candidate;
pub mod job;
pub mod manifest;
pub mod params;
pub mod sequence;

// Re-export common types
pub use candidate::Candidate;
pub use job::{InterpolationJob, JobStatus, RunId};
pub use manifest::{Animation, AnimationMetadata, RunManifest, StageTimings};
pub use params::{
    AlphaMode, InterpolationParams, ParseAlphaModeError, DEFAULT_BLACK_THRESHOLD,
    DEFAULT_EXPONENT, DEFAULT_FEATHER, DEFAULT_FPS, DEFAULT_SCALE,
};
pub use sequence::{ParseStrategyError, SelectionStrategy, SequenceEntry, SequenceManifest};
