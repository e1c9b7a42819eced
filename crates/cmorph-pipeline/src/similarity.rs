//! Pairwise cosine similarity over the embedding index.

use ndarray::Array2;

/// Cosine similarity matrix of unit-length embedding rows.
///
/// Because the rows are normalized, the inner product with the transpose
/// is exactly the cosine similarity: symmetric, diagonal 1.0, entries in
/// `[-1, 1]` (within floating tolerance). Total for any input, including
/// an empty matrix.
pub fn cosine_similarity_matrix(embeddings: &Array2<f32>) -> Array2<f32> {
    embeddings.dot(&embeddings.t())
}
