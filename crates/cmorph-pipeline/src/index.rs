//! Embedding index builder: one normalized vector per surviving candidate.

use ndarray::Array2;
use std::path::PathBuf;
use tracing::{debug, warn};

use cmorph_media::embedding::{normalize_l2, EmbeddingProvider};
use cmorph_models::Candidate;

/// Parallel arrays of surviving candidate paths and their unit-length
/// embedding rows. Row `i` of `vectors` embeds `paths[i]`.
#[derive(Debug)]
pub struct EmbeddingIndex {
    pub paths: Vec<PathBuf>,
    pub vectors: Array2<f32>,
}

impl EmbeddingIndex {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Embed every valid candidate exactly once, dropping the ones that fail.
///
/// The embedding dimension is fixed by the first accepted vector; a later
/// vector of a different length invalidates its candidate rather than the
/// run. Vectors are L2-normalized before storage so the similarity matrix
/// can be a plain inner product.
pub async fn build_index(
    candidates: &mut [Candidate],
    provider: &dyn EmbeddingProvider,
) -> EmbeddingIndex {
    let mut dimension: Option<usize> = None;

    for candidate in candidates.iter_mut().filter(|c| c.valid) {
        let mut vector = match provider.embed(&candidate.path).await {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %candidate.path.display(), error = %e, "dropping candidate: embedding failed");
                candidate.invalidate(format!("embedding failed: {e}"));
                continue;
            }
        };

        if let Some(d) = dimension {
            if vector.len() != d {
                warn!(
                    path = %candidate.path.display(),
                    expected = d,
                    found = vector.len(),
                    "dropping candidate: embedding dimension mismatch"
                );
                candidate.invalidate(format!(
                    "embedding dimension {} does not match index dimension {d}",
                    vector.len()
                ));
                continue;
            }
        }

        if let Err(e) = normalize_l2(&mut vector) {
            warn!(path = %candidate.path.display(), error = %e, "dropping candidate: unusable embedding");
            candidate.invalidate(e.to_string());
            continue;
        }

        dimension = dimension.or(Some(vector.len()));
        candidate.embedding = Some(vector);
    }

    let paths: Vec<PathBuf> = candidates
        .iter()
        .filter(|c| c.valid && c.embedding.is_some())
        .map(|c| c.path.clone())
        .collect();

    let dimension = dimension.unwrap_or(0);
    let mut flat = Vec::with_capacity(paths.len() * dimension);
    for candidate in candidates.iter().filter(|c| c.valid) {
        if let Some(embedding) = &candidate.embedding {
            flat.extend_from_slice(embedding);
        }
    }

    let vectors = Array2::from_shape_vec((paths.len(), dimension), flat)
        .unwrap_or_else(|_| Array2::zeros((0, 0)));

    debug!(embedded = paths.len(), dimension, "embedding index built");
    EmbeddingIndex { paths, vectors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cmorph_media::{MediaError, MediaResult};
    use std::path::Path;
    use std::sync::Mutex;

    struct StubProvider {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, image: &Path) -> MediaResult<Vec<f32>> {
            self.calls.lock().unwrap().push(image.to_path_buf());
            let name = image.file_name().unwrap().to_string_lossy().to_string();
            match name.as_str() {
                "fails.png" => Err(MediaError::embedding_failed("stub failure")),
                "short.png" => Ok(vec![1.0]),
                _ => Ok(vec![2.0, 0.0, 0.0]),
            }
        }
    }

    #[tokio::test]
    async fn test_build_index_normalizes_and_drops_failures() {
        let mut candidates = vec![
            Candidate::new("a.png", 1.0),
            Candidate::new("fails.png", 1.0),
            Candidate::new("short.png", 1.0),
            Candidate::new("b.png", 1.0),
        ];

        let provider = StubProvider::new();
        let index = build_index(&mut candidates, &provider).await;

        assert_eq!(index.len(), 2);
        assert_eq!(index.paths, vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);
        assert_eq!(index.vectors.dim(), (2, 3));
        // 2.0 along one axis normalizes to a unit vector.
        assert!((index.vectors[[0, 0]] - 1.0).abs() < 1e-6);

        assert!(!candidates[1].valid);
        assert!(!candidates[2].valid);
    }

    #[tokio::test]
    async fn test_each_image_embedded_once() {
        let mut candidates = vec![Candidate::new("a.png", 1.0), Candidate::new("b.png", 1.0)];
        let provider = StubProvider::new();

        build_index(&mut candidates, &provider).await;
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_candidates_not_embedded() {
        let mut candidates = vec![
            Candidate::rejected("sparse.png", 0.05, "below threshold"),
            Candidate::new("a.png", 1.0),
        ];
        let provider = StubProvider::new();

        let index = build_index(&mut candidates, &provider).await;
        assert_eq!(index.len(), 1);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[PathBuf::from("a.png")]);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_index() {
        let mut candidates = Vec::new();
        let provider = StubProvider::new();

        let index = build_index(&mut candidates, &provider).await;
        assert!(index.is_empty());
        assert_eq!(index.vectors.dim(), (0, 0));
    }
}
