//! Quality filter: drop candidates with too little usable foreground.

use std::path::PathBuf;
use tracing::{debug, warn};

use cmorph_media::quality;
use cmorph_models::Candidate;

/// Result of the quality filter stage.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Every scanned candidate, valid or not, in input order
    pub candidates: Vec<Candidate>,
    /// How many were rejected (low coverage or unreadable)
    pub rejected: usize,
}

impl FilterOutcome {
    /// Paths of the candidates that survived, in input order.
    pub fn valid_paths(&self) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .filter(|c| c.valid)
            .map(|c| c.path.clone())
            .collect()
    }
}

/// Screen candidate images by alpha coverage.
///
/// An unreadable image is a reject, not a fatal error. Images without an
/// alpha channel are accepted unconditionally (coverage 1.0). Filtering an
/// already-filtered list with the same threshold returns the same list.
pub fn filter_candidates(paths: &[PathBuf], min_foreground_ratio: f32) -> FilterOutcome {
    let mut candidates = Vec::with_capacity(paths.len());
    let mut rejected = 0;

    for path in paths {
        match quality::foreground_ratio(path) {
            Ok(ratio) if ratio >= min_foreground_ratio => {
                candidates.push(Candidate::new(path.clone(), ratio));
            }
            Ok(ratio) => {
                debug!(
                    path = %path.display(),
                    ratio,
                    threshold = min_foreground_ratio,
                    "rejecting candidate below foreground threshold"
                );
                rejected += 1;
                candidates.push(Candidate::rejected(
                    path.clone(),
                    ratio,
                    format!("foreground ratio {ratio:.3} below threshold {min_foreground_ratio:.3}"),
                ));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rejecting unreadable candidate");
                rejected += 1;
                candidates.push(Candidate::rejected(path.clone(), 0.0, e.to_string()));
            }
        }
    }

    FilterOutcome { candidates, rejected }
}
