//! Interpolation parameters passed to the external engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default frame-density exponent (2^4 = 16 frames per pair)
pub const DEFAULT_EXPONENT: u32 = 4;
/// Default engine-side resize hint
pub const DEFAULT_SCALE: f32 = 1.0;
/// Default pixel-intensity cutoff for artifact suppression near black
pub const DEFAULT_BLACK_THRESHOLD: u8 = 10;
/// Default edge-softening strength for the alpha composite
pub const DEFAULT_FEATHER: f32 = 2.0;
/// Default playback rate of the stitched animation
pub const DEFAULT_FPS: u32 = 30;

/// How the alpha channels of the two endpoint images combine across the
/// frames generated for a pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    /// Every frame keeps the union of both endpoint alphas
    #[default]
    Union,
    /// Alpha blends from the first endpoint's toward the second's
    Progressive,
    /// Every frame keeps only the overlap of both endpoint alphas
    Intersection,
}

impl AlphaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlphaMode::Union => "union",
            AlphaMode::Progressive => "progressive",
            AlphaMode::Intersection => "intersection",
        }
    }
}

impl fmt::Display for AlphaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown alpha mode name.
#[derive(Debug, Error)]
#[error("unknown alpha mode: {0}")]
pub struct ParseAlphaModeError(pub String);

impl FromStr for AlphaMode {
    type Err = ParseAlphaModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(AlphaMode::Union),
            "progressive" => Ok(AlphaMode::Progressive),
            "intersection" => Ok(AlphaMode::Intersection),
            other => Err(ParseAlphaModeError(other.to_string())),
        }
    }
}

/// Parameters for one interpolation engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterpolationParams {
    /// Frame-density exponent; the engine produces 2^exponent frames per
    /// pair, endpoints inclusive
    #[serde(default = "default_exponent")]
    pub exponent: u32,

    /// Engine-side resize hint
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Alpha combination mode across the pair's frames
    #[serde(default)]
    pub alpha_mode: AlphaMode,

    /// Pixel-intensity cutoff below which the engine suppresses
    /// interpolation artifacts
    #[serde(default = "default_black_threshold")]
    pub black_threshold: u8,

    /// Edge-softening strength for the alpha composite
    #[serde(default = "default_feather")]
    pub feather: f32,
}

fn default_exponent() -> u32 {
    DEFAULT_EXPONENT
}
fn default_scale() -> f32 {
    DEFAULT_SCALE
}
fn default_black_threshold() -> u8 {
    DEFAULT_BLACK_THRESHOLD
}
fn default_feather() -> f32 {
    DEFAULT_FEATHER
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            scale: DEFAULT_SCALE,
            alpha_mode: AlphaMode::default(),
            black_threshold: DEFAULT_BLACK_THRESHOLD,
            feather: DEFAULT_FEATHER,
        }
    }
}

impl InterpolationParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames the engine produces for one pair, endpoints inclusive.
    pub fn frames_per_pair(&self) -> usize {
        1usize << self.exponent
    }

    /// Returns params with an updated exponent.
    pub fn with_exponent(mut self, exponent: u32) -> Self {
        self.exponent = exponent;
        self
    }

    /// Returns params with an updated alpha mode.
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }
}
