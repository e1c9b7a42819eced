//! Frame-interpolation engine contract and the subprocess-backed adapter.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use cmorph_models::InterpolationParams;

use crate::command::{check_engine, EngineRunner, InterpolateCommand};
use crate::error::{MediaError, MediaResult};

/// External frame-interpolation engine: `2^exponent` frames per image
/// pair, endpoints inclusive, written as numbered files into a directory
/// owned by the caller.
///
/// Implementations must treat a non-zero exit or timeout as total failure;
/// no partial output is collected.
#[async_trait]
pub trait FrameInterpolator: Send + Sync {
    /// Interpolate one pair into `out_dir`, returning the ordered frames.
    async fn run_pair(
        &self,
        image_a: &Path,
        image_b: &Path,
        params: &InterpolationParams,
        out_dir: &Path,
    ) -> MediaResult<Vec<PathBuf>>;
}

/// Interpolator that shells out to the engine binary.
pub struct EngineInterpolator {
    runner: EngineRunner,
    model_dir: PathBuf,
}

impl EngineInterpolator {
    /// Create an interpolator for an engine binary and model directory.
    pub fn new(binary: impl AsRef<Path>, model_dir: impl AsRef<Path>) -> Self {
        Self {
            runner: EngineRunner::new(binary),
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    /// Set the per-pair timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Preflight: check the engine binary is resolvable before any job
    /// is dispatched.
    pub fn check(&self) -> MediaResult<PathBuf> {
        check_engine(self.runner.binary())
    }
}

#[async_trait]
impl FrameInterpolator for EngineInterpolator {
    async fn run_pair(
        &self,
        image_a: &Path,
        image_b: &Path,
        params: &InterpolationParams,
        out_dir: &Path,
    ) -> MediaResult<Vec<PathBuf>> {
        let cmd = InterpolateCommand::new(image_a, image_b, &self.model_dir, out_dir, params);
        self.runner.run(&cmd).await?;

        let frames = collect_frames(out_dir, cmd.expected_frames())?;
        debug!(
            "engine produced {} frames for {} -> {}",
            frames.len(),
            image_a.display(),
            image_b.display()
        );
        Ok(frames)
    }
}

/// Collect the engine's numbered PNG frames from `dir`, sorted by name.
///
/// The engine writes sequentially numbered files, so lexicographic order
/// is frame order. Anything but exactly `expected` frames is a failure.
pub fn collect_frames(dir: &Path, expected: usize) -> MediaResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .collect();
    frames.sort();

    if frames.len() != expected {
        return Err(MediaError::MissingFrames {
            expected,
            found: frames.len(),
        });
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch_frames(dir: &Path, count: usize) {
        for i in 0..count {
            std::fs::write(dir.join(format!("frame_{i:03}.png")), b"png").unwrap();
        }
    }

    #[test]
    fn test_collect_frames_sorted() {
        let dir = TempDir::new().unwrap();
        touch_frames(dir.path(), 4);
        // Non-frame files are ignored.
        std::fs::write(dir.path().join("log.txt"), b"noise").unwrap();

        let frames = collect_frames(dir.path(), 4).unwrap();
        assert_eq!(frames.len(), 4);
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["frame_000.png", "frame_001.png", "frame_002.png", "frame_003.png"]);
    }

    #[test]
    fn test_collect_frames_count_mismatch() {
        let dir = TempDir::new().unwrap();
        touch_frames(dir.path(), 3);

        let err = collect_frames(dir.path(), 8).unwrap_err();
        match err {
            MediaError::MissingFrames { expected, found } => {
                assert_eq!(expected, 8);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
