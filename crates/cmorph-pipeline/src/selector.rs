//! Sequence selection: order candidates for maximum visual continuity.

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use cmorph_models::SelectionStrategy;

use crate::error::{PipelineError, PipelineResult};

/// Choose an ordered subset of candidate indices.
///
/// Both strategies start from the most central candidate (highest mean
/// similarity to all others) and grow the sequence one index at a time:
/// - `Greedy` appends the unvisited candidate most similar to the last
///   appended one.
/// - `Balanced` scores unvisited candidates as `similarity_to_last +
///   diversity_weight * mean_distance_to_selected`, trading strict local
///   similarity for spread across the embedding space.
///
/// Ties break toward the lowest index, so identical inputs always yield
/// identical sequences. The result has no duplicates and length exactly
/// `min(count, N)`; `count` of `None` means "use every candidate".
pub fn select_sequence(
    similarity: &Array2<f32>,
    embeddings: &Array2<f32>,
    count: Option<usize>,
    strategy: SelectionStrategy,
    diversity_weight: f32,
) -> PipelineResult<Vec<usize>> {
    let n = similarity.nrows();
    debug_assert_eq!(n, similarity.ncols());
    debug_assert_eq!(n, embeddings.nrows());

    if n < 2 {
        return Err(PipelineError::InsufficientCandidates(n));
    }

    let target = count.map_or(n, |c| c.min(n));

    let mut selected = Vec::with_capacity(target);
    let mut visited = vec![false; n];

    let start = most_central(similarity);
    selected.push(start);
    visited[start] = true;

    while selected.len() < target {
        let last = selected[selected.len() - 1];
        let mut best: Option<(usize, f32)> = None;

        for j in (0..n).filter(|&j| !visited[j]) {
            let score = match strategy {
                SelectionStrategy::Greedy => similarity[[last, j]],
                SelectionStrategy::Balanced => {
                    similarity[[last, j]]
                        + diversity_weight * mean_distance(embeddings, j, &selected)
                }
            };
            // Strict greater keeps the lowest index on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((j, score));
            }
        }

        match best {
            Some((j, _)) => {
                selected.push(j);
                visited[j] = true;
            }
            None => break,
        }
    }

    debug!(
        strategy = %strategy,
        selected = selected.len(),
        pool = n,
        "sequence selected"
    );
    Ok(selected)
}

/// Index with the highest mean similarity to all candidates.
///
/// The diagonal adds a constant 1/N to every row mean, so including it
/// cannot change the argmax.
fn most_central(similarity: &Array2<f32>) -> usize {
    let n = similarity.nrows();
    let mut best = 0;
    let mut best_mean = f32::NEG_INFINITY;
    for i in 0..n {
        let mean = similarity.row(i).sum() / n as f32;
        if mean > best_mean {
            best = i;
            best_mean = mean;
        }
    }
    best
}

/// Mean Euclidean distance from candidate `j` to the selected set.
fn mean_distance(embeddings: &Array2<f32>, j: usize, selected: &[usize]) -> f32 {
    let row = embeddings.row(j);
    let sum: f32 = selected
        .iter()
        .map(|&s| euclidean(row, embeddings.row(s)))
        .sum();
    sum / selected.len() as f32
}

fn euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity_matrix;
    use ndarray::Array2;

    /// Unit vectors at increasing angles on the circle, so neighbors in
    /// index order are also nearest neighbors in embedding space.
    fn fan_embeddings(n: usize) -> Array2<f32> {
        let mut flat = Vec::with_capacity(n * 2);
        for i in 0..n {
            let theta = 0.25 * i as f32;
            flat.push(theta.cos());
            flat.push(theta.sin());
        }
        Array2::from_shape_vec((n, 2), flat).unwrap()
    }

    #[test]
    fn test_length_and_uniqueness() {
        let emb = fan_embeddings(8);
        let sim = cosine_similarity_matrix(&emb);

        for count in [None, Some(3), Some(8), Some(100)] {
            let seq =
                select_sequence(&sim, &emb, count, SelectionStrategy::Greedy, 0.3).unwrap();
            assert_eq!(seq.len(), count.map_or(8, |c| c.min(8)));

            let mut sorted = seq.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), seq.len(), "duplicate index in {seq:?}");
        }
    }

    #[test]
    fn test_balanced_invariants() {
        let emb = fan_embeddings(10);
        let sim = cosine_similarity_matrix(&emb);

        let seq = select_sequence(&sim, &emb, Some(6), SelectionStrategy::Balanced, 0.3).unwrap();
        assert_eq!(seq.len(), 6);
        let mut sorted = seq.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_greedy_walks_to_nearest_neighbor() {
        let emb = fan_embeddings(5);
        let sim = cosine_similarity_matrix(&emb);

        let seq = select_sequence(&sim, &emb, None, SelectionStrategy::Greedy, 0.3).unwrap();
        // The fan is symmetric around its middle, so the walk starts there,
        // sweeps one flank angle by angle, then crosses to the other.
        assert_eq!(seq[0], 2);
        assert!(
            seq == vec![2, 1, 0, 3, 4] || seq == vec![2, 3, 4, 1, 0],
            "unexpected walk: {seq:?}"
        );
    }

    #[test]
    fn test_greedy_deterministic() {
        let emb = fan_embeddings(12);
        let sim = cosine_similarity_matrix(&emb);

        let a = select_sequence(&sim, &emb, Some(7), SelectionStrategy::Greedy, 0.3).unwrap();
        let b = select_sequence(&sim, &emb, Some(7), SelectionStrategy::Greedy, 0.3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_insufficient_candidates() {
        let emb = fan_embeddings(1);
        let sim = cosine_similarity_matrix(&emb);

        let err = select_sequence(&sim, &emb, None, SelectionStrategy::Greedy, 0.3).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientCandidates(1)));

        let empty = Array2::<f32>::zeros((0, 0));
        let err = select_sequence(&empty, &empty, None, SelectionStrategy::Greedy, 0.3).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientCandidates(0)));
    }
}
