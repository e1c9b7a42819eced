//! Frame stitching: merge per-pair batches into one numbered sequence.

use std::path::Path;
use tracing::{debug, info};

use cmorph_models::{Animation, InterpolationJob, JobStatus};

use crate::error::{PipelineError, PipelineResult};

/// Concatenate per-job frame batches into `animation_dir` as one
/// continuously numbered sequence.
///
/// The first successful job contributes all of its frames; every later
/// successful job skips its first frame, which duplicates the previous
/// contribution's boundary image. Failed jobs contribute nothing and
/// their gap is simply absent, so the stitched total is
/// `sum over successful jobs of (frames - 1) + 1`. Frames are copied, not
/// moved: job temp directories may live on another filesystem.
pub async fn stitch(
    jobs: &[InterpolationJob],
    animation_dir: &Path,
    fps: u32,
    source_image_count: usize,
) -> PipelineResult<Animation> {
    tokio::fs::create_dir_all(animation_dir).await?;

    let mut frames = Vec::new();
    let mut any_contributed = false;

    for job in jobs {
        if job.status != JobStatus::Success {
            continue;
        }

        // Skip the shared boundary frame once a previous job contributed.
        let skip = usize::from(any_contributed);
        for produced in job.produced_frames.iter().skip(skip) {
            let dest = animation_dir.join(format!("frame_{:05}.png", frames.len()));
            tokio::fs::copy(produced, &dest).await?;
            frames.push(dest);
        }
        any_contributed = true;

        debug!(
            pair = job.pair_index,
            contributed = job.frame_count() - skip,
            running_total = frames.len(),
            "job frames stitched"
        );
    }

    if frames.is_empty() {
        return Err(PipelineError::NoSuccessfulJobs(jobs.len()));
    }

    let total_frames = frames.len();
    let duration_seconds = total_frames as f64 / fps as f64;
    info!(
        total_frames,
        fps,
        duration_seconds,
        "animation stitched"
    );

    Ok(Animation {
        frames,
        fps,
        total_frames,
        duration_seconds,
        source_image_count,
        jobs: jobs.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmorph_models::InterpolationParams;
    use tempfile::TempDir;

    /// Build a resolved job whose frames exist on disk under `dir`.
    async fn successful_job(dir: &TempDir, pair_index: usize, frame_count: usize) -> InterpolationJob {
        let job_dir = dir.path().join(format!("job_{pair_index}"));
        tokio::fs::create_dir_all(&job_dir).await.unwrap();

        let mut frames = Vec::new();
        for i in 0..frame_count {
            let path = job_dir.join(format!("frame_{i:03}.png"));
            tokio::fs::write(&path, format!("job{pair_index}frame{i}"))
                .await
                .unwrap();
            frames.push(path);
        }

        let mut job = InterpolationJob::new(
            pair_index,
            format!("{pair_index}.png"),
            format!("{}.png", pair_index + 1),
            InterpolationParams::default(),
        );
        job.succeed(frames, 5);
        job
    }

    fn failed_job(pair_index: usize) -> InterpolationJob {
        let mut job = InterpolationJob::new(
            pair_index,
            format!("{pair_index}.png"),
            format!("{}.png", pair_index + 1),
            InterpolationParams::default(),
        );
        job.fail("engine crashed", 5);
        job
    }

    #[tokio::test]
    async fn test_frame_count_law_all_success() {
        // k = 4 images, e = 3: (k-1) * (2^e - 1) + 1 = 22.
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut jobs = Vec::new();
        for i in 0..3 {
            jobs.push(successful_job(&src, i, 8).await);
        }

        let animation = stitch(&jobs, out.path(), 30, 4).await.unwrap();
        assert_eq!(animation.total_frames, 22);
        assert!((animation.duration_seconds - 22.0 / 30.0).abs() < 1e-9);

        // Continuous numbering from zero.
        for (i, frame) in animation.frames.iter().enumerate() {
            assert_eq!(
                frame.file_name().unwrap().to_string_lossy(),
                format!("frame_{i:05}.png")
            );
            assert!(frame.exists());
        }
    }

    #[tokio::test]
    async fn test_boundary_frame_deduplicated() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![successful_job(&src, 0, 4).await, successful_job(&src, 1, 4).await];

        let animation = stitch(&jobs, out.path(), 30, 3).await.unwrap();
        assert_eq!(animation.total_frames, 7);

        // Frame 4 must be job 1's second frame, not its first.
        let content = tokio::fs::read_to_string(&animation.frames[4]).await.unwrap();
        assert_eq!(content, "job1frame1");
    }

    #[tokio::test]
    async fn test_middle_job_failure_leaves_gap() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![
            successful_job(&src, 0, 8).await,
            failed_job(1),
            successful_job(&src, 2, 8).await,
        ];

        let animation = stitch(&jobs, out.path(), 30, 4).await.unwrap();
        // Successful jobs contribute (8 - 1) each, plus the single
        // boundary credit: 7 + 7 + 1 = 15.
        assert_eq!(animation.total_frames, 15);
        assert_eq!(animation.failed_jobs(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_job_adjusts_boundary() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![failed_job(0), successful_job(&src, 1, 8).await];

        let animation = stitch(&jobs, out.path(), 30, 3).await.unwrap();
        // The first successful job keeps all of its frames.
        assert_eq!(animation.total_frames, 8);

        let content = tokio::fs::read_to_string(&animation.frames[0]).await.unwrap();
        assert_eq!(content, "job1frame0");
    }

    #[tokio::test]
    async fn test_all_jobs_failed_is_fatal() {
        let out = TempDir::new().unwrap();
        let jobs = vec![failed_job(0), failed_job(1)];

        let err = stitch(&jobs, out.path(), 30, 3).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSuccessfulJobs(2)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_single_pair_sequence() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![successful_job(&src, 0, 16).await];

        let animation = stitch(&jobs, out.path(), 24, 2).await.unwrap();
        assert_eq!(animation.total_frames, 16);
        assert_eq!(animation.source_image_count, 2);
    }
}
