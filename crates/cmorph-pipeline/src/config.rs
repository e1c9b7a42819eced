//! Pipeline configuration.

use std::path::PathBuf;

use cmorph_media::{CommandEmbedder, EngineRunner};
use cmorph_models::DEFAULT_FPS;

/// Pipeline configuration.
///
/// The numeric defaults (quality threshold, diversity weight) are tuned
/// reasonable values with no deeper significance; override them per
/// deployment via the `CMORPH_*` environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum usable-foreground coverage for a candidate to survive
    pub min_foreground_ratio: f32,
    /// Diversity weight for the balanced selection strategy
    pub diversity_weight: f32,
    /// Playback rate of stitched animations
    pub fps: u32,
    /// Per-pair engine timeout
    pub engine_timeout_secs: u64,
    /// Per-image embedding timeout
    pub embed_timeout_secs: u64,
    /// Interpolation jobs allowed in flight at once
    pub max_parallel_jobs: usize,
    /// Interpolation engine binary
    pub engine_bin: PathBuf,
    /// Trained-model directory for the engine
    pub model_dir: PathBuf,
    /// Embedding binary
    pub embed_bin: PathBuf,
    /// Root directory for per-character output
    pub output_root: PathBuf,
    /// Directory for per-job temporary frame output
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_foreground_ratio: 0.12,
            diversity_weight: 0.3,
            fps: DEFAULT_FPS,
            engine_timeout_secs: EngineRunner::DEFAULT_TIMEOUT_SECS,
            embed_timeout_secs: CommandEmbedder::DEFAULT_TIMEOUT_SECS,
            max_parallel_jobs: 1,
            engine_bin: PathBuf::from("cmorph-interp"),
            model_dir: PathBuf::from("models/interp"),
            embed_bin: PathBuf::from("cmorph-embed"),
            output_root: PathBuf::from("output"),
            work_dir: PathBuf::from("/tmp/cmorph"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_foreground_ratio: std::env::var("CMORPH_MIN_FOREGROUND_RATIO")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_foreground_ratio),
            diversity_weight: std::env::var("CMORPH_DIVERSITY_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.diversity_weight),
            fps: std::env::var("CMORPH_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fps),
            engine_timeout_secs: std::env::var("CMORPH_ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.engine_timeout_secs),
            embed_timeout_secs: std::env::var("CMORPH_EMBED_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.embed_timeout_secs),
            max_parallel_jobs: std::env::var("CMORPH_MAX_PARALLEL_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel_jobs),
            engine_bin: std::env::var("CMORPH_ENGINE_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.engine_bin),
            model_dir: std::env::var("CMORPH_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            embed_bin: std::env::var("CMORPH_EMBED_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.embed_bin),
            output_root: std::env::var("CMORPH_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            work_dir: std::env::var("CMORPH_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = PipelineConfig::default();
        assert!(config.min_foreground_ratio > 0.0 && config.min_foreground_ratio < 1.0);
        assert!(config.diversity_weight > 0.0);
        assert!(config.fps > 0);
        assert_eq!(config.max_parallel_jobs, 1);
    }
}
