//! Interpolation engine command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use cmorph_models::InterpolationParams;

use crate::error::{MediaError, MediaResult};

/// Builder for one interpolation engine invocation.
///
/// The engine takes the two endpoint images positionally, followed by the
/// frame-density exponent, trained-model directory, resize hint, output
/// directory, and alpha-handling flags.
#[derive(Debug, Clone)]
pub struct InterpolateCommand {
    /// First endpoint image
    image_a: PathBuf,
    /// Second endpoint image
    image_b: PathBuf,
    /// Trained-model directory
    model_dir: PathBuf,
    /// Directory the engine writes numbered frames into
    output_dir: PathBuf,
    /// Engine parameters
    params: InterpolationParams,
}

impl InterpolateCommand {
    /// Create a command for one pair.
    pub fn new(
        image_a: impl AsRef<Path>,
        image_b: impl AsRef<Path>,
        model_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        params: &InterpolationParams,
    ) -> Self {
        Self {
            image_a: image_a.as_ref().to_path_buf(),
            image_b: image_b.as_ref().to_path_buf(),
            model_dir: model_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            params: params.clone(),
        }
    }

    /// Frames the engine is expected to produce.
    pub fn expected_frames(&self) -> usize {
        self.params.frames_per_pair()
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        vec![
            self.image_a.to_string_lossy().to_string(),
            self.image_b.to_string_lossy().to_string(),
            "--exp".to_string(),
            self.params.exponent.to_string(),
            "--model".to_string(),
            self.model_dir.to_string_lossy().to_string(),
            "--scale".to_string(),
            format!("{:.2}", self.params.scale),
            "--output".to_string(),
            self.output_dir.to_string_lossy().to_string(),
            "--alpha-mode".to_string(),
            self.params.alpha_mode.as_str().to_string(),
            "--black-threshold".to_string(),
            self.params.black_threshold.to_string(),
            "--feather".to_string(),
            format!("{:.2}", self.params.feather),
        ]
    }
}

/// Runner for engine commands with timeout enforcement.
///
/// The engine exposes no progress protocol; a non-zero exit or timeout is
/// the sole failure signal, so the runner captures stderr for diagnostics
/// and kills the process when the timeout fires.
pub struct EngineRunner {
    /// Engine binary path or name
    binary: PathBuf,
    /// Timeout in seconds
    timeout_secs: u64,
}

impl EngineRunner {
    /// Default per-pair timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Create a runner for an engine binary.
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Engine binary this runner invokes.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run one engine command to completion.
    pub async fn run(&self, cmd: &InterpolateCommand) -> MediaResult<()> {
        let args = cmd.build_args();
        debug!("Running engine: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take();
        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let status = self.wait_for_completion(&mut child).await?;
        let stderr = stderr_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::engine_failed(
                "engine exited with non-zero status",
                (!stderr.trim().is_empty()).then(|| stderr.trim().to_string()),
                status.code(),
            ))
        }
    }

    /// Wait for the child process, killing it when the timeout fires.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let timeout = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            child.wait(),
        );
        match timeout.await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    "engine timed out after {} seconds, killing process",
                    self.timeout_secs
                );
                let _ = child.kill().await;
                Err(MediaError::Timeout(self.timeout_secs))
            }
        }
    }
}

/// Check that the interpolation engine binary is resolvable.
pub fn check_engine(binary: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let binary = binary.as_ref();
    which::which(binary).map_err(|_| MediaError::EngineNotFound(binary.display().to_string()))
}
