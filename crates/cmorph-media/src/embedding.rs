//! Embedding-model contract and the subprocess-backed provider.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// External embedding model: one fixed-dimension feature vector per image.
///
/// The model is a stateless black box; the caller normalizes the returned
/// vector and must not embed the same image twice within one run.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one image into a feature vector.
    async fn embed(&self, image: &Path) -> MediaResult<Vec<f32>>;
}

/// Scale a vector to unit L2 length in place.
///
/// A (near-)zero vector carries no direction and is rejected as invalid.
pub fn normalize_l2(v: &mut [f32]) -> MediaResult<()> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= f32::EPSILON {
        return Err(MediaError::invalid_embedding(format!(
            "vector of {} elements has no usable norm",
            v.len()
        )));
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Embedding provider backed by an external binary.
///
/// Invokes `<binary> --image <path> [--model <dir>]` and parses a JSON
/// float array from stdout.
pub struct CommandEmbedder {
    binary: PathBuf,
    model_dir: Option<PathBuf>,
    timeout_secs: u64,
}

impl CommandEmbedder {
    /// Default per-image timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Create an embedder for a binary.
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            model_dir: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Point the binary at a model directory.
    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the per-image timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Check that the embedding binary is resolvable.
    pub fn check(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary)
            .map_err(|_| MediaError::EmbedderNotFound(self.binary.display().to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for CommandEmbedder {
    async fn embed(&self, image: &Path) -> MediaResult<Vec<f32>> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--image").arg(image);
        if let Some(model_dir) = &self.model_dir {
            cmd.arg("--model").arg(model_dir);
        }
        debug!("Embedding {}", image.display());

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            output,
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(MediaError::Timeout(self.timeout_secs)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::embedding_failed(format!(
                "{}: exit {:?}: {}",
                image.display(),
                output.status.code(),
                stderr.trim()
            )));
        }

        let vector: Vec<f32> = serde_json::from_slice(&output.stdout)?;
        if vector.is_empty() {
            return Err(MediaError::invalid_embedding(format!(
                "{}: empty vector",
                image.display()
            )));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_l2_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v).unwrap();

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_l2_rejects_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        assert!(matches!(
            normalize_l2(&mut v),
            Err(MediaError::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn test_embedder_check_missing_binary() {
        let embedder = CommandEmbedder::new("definitely-not-a-real-embed-binary");
        assert!(matches!(
            embedder.check(),
            Err(MediaError::EmbedderNotFound(_))
        ));
    }
}
