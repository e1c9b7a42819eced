#![deny(unreachable_patterns)]
//! Media boundary for the CharMorph animation pipeline.
//!
//! This crate provides:
//! - Alpha-coverage quality analysis of candidate stills
//! - The embedding-model contract and a subprocess-backed provider
//! - The frame-interpolation engine contract, command building, and a
//!   subprocess runner with timeout enforcement

pub mod command;
pub mod embedding;
pub mod error;
pub mod interpolate;
pub mod quality;

pub use command::{check_engine, EngineRunner, InterpolateCommand};
pub use embedding::{normalize_l2, CommandEmbedder, EmbeddingProvider};
pub use error::{MediaError, MediaResult};
pub use interpolate::{collect_frames, EngineInterpolator, FrameInterpolator};
pub use quality::{foreground_ratio, OPAQUE_ALPHA};
