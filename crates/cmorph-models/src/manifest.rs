//! Animation results and the durable run manifest.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Candidate, InterpolationJob, InterpolationParams, RunId, SelectionStrategy};

/// The stitched animation: one continuously numbered frame sequence.
///
/// A failed job contributes zero frames, so `total_frames` is
/// data-dependent on how many jobs succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct Animation {
    /// Final frame paths in playback order
    pub frames: Vec<PathBuf>,

    /// Playback rate
    pub fps: u32,

    /// Number of stitched frames
    pub total_frames: usize,

    /// total_frames / fps
    pub duration_seconds: f64,

    /// Number of source images in the interpolated sequence
    pub source_image_count: usize,

    /// Per-pair outcomes, in pair order
    pub jobs: Vec<InterpolationJob>,
}

impl Animation {
    /// Jobs that produced frames.
    pub fn successful_jobs(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == crate::JobStatus::Success)
            .count()
    }

    /// Jobs that failed and left a gap.
    pub fn failed_jobs(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == crate::JobStatus::Failed)
            .count()
    }
}

/// Metadata written next to the final animation frames.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnimationMetadata {
    /// Character the animation belongs to
    pub character: String,

    /// Animation name (output directory name)
    pub output_name: String,

    /// Source file names of the interpolated sequence, in order
    pub source_images: Vec<String>,

    /// Number of stitched frames
    pub total_frames: usize,

    /// Playback rate
    pub fps: u32,

    /// total_frames / fps
    pub duration_seconds: f64,

    /// Wall-clock seconds spent on the whole run
    pub processing_time: f64,

    /// Frame-density exponent used for every pair
    pub exponent: u32,

    /// Full engine parameters
    pub interpolation_params: InterpolationParams,
}

/// Wall-clock timings per pipeline stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct StageTimings {
    pub filter_ms: u64,
    pub embed_ms: u64,
    pub select_ms: u64,
    pub interpolate_ms: u64,
    pub stitch_ms: u64,
    pub total_ms: u64,
}

/// Durable record of one pipeline run: inputs, choices, and outcomes.
///
/// Written once at completion. A partially degraded run (some jobs failed)
/// is distinguishable from a fully successful one by `failed_jobs` and the
/// per-job records, even though both complete as "success".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunManifest {
    /// Run identifier
    pub run_id: RunId,

    /// Character the run belongs to
    pub character: String,

    /// Animation name
    pub output_name: String,

    /// When the manifest was assembled
    pub created_at: DateTime<Utc>,

    /// Selection strategy used
    pub strategy: SelectionStrategy,

    /// Images scanned from the input
    pub input_count: usize,

    /// Candidates rejected by the quality filter or unreadable
    pub rejected_count: usize,

    /// Candidates that survived embedding
    pub embedded_count: usize,

    /// Jobs that failed and contributed no frames
    pub failed_jobs: usize,

    /// Stitched frame total
    pub total_frames: usize,

    /// Playback rate
    pub fps: u32,

    /// total_frames / fps
    pub duration_seconds: f64,

    /// Source file names of the chosen sequence, in order
    pub sequence: Vec<String>,

    /// Every candidate's metadata, including rejected ones
    pub candidates: Vec<Candidate>,

    /// Per-pair job outcomes
    pub jobs: Vec<InterpolationJob>,

    /// Wall-clock timings per stage
    pub timings: StageTimings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobStatus;

    fn job(pair_index: usize, status: JobStatus) -> InterpolationJob {
        let mut j = InterpolationJob::new(
            pair_index,
            format!("{pair_index}.png"),
            format!("{}.png", pair_index + 1),
            InterpolationParams::default(),
        );
        match status {
            JobStatus::Success => j.succeed(vec![PathBuf::from("f.png")], 10),
            JobStatus::Failed => j.fail("boom", 10),
            JobStatus::Pending => {}
        }
        j
    }

    #[test]
    fn test_animation_job_counts() {
        let animation = Animation {
            frames: vec![PathBuf::from("frame_00000.png")],
            fps: 30,
            total_frames: 1,
            duration_seconds: 1.0 / 30.0,
            source_image_count: 3,
            jobs: vec![job(0, JobStatus::Success), job(1, JobStatus::Failed)],
        };

        assert_eq!(animation.successful_jobs(), 1);
        assert_eq!(animation.failed_jobs(), 1);
    }
}
