//! Interpolation orchestration: one engine job per consecutive pair.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use cmorph_media::FrameInterpolator;
use cmorph_models::{InterpolationJob, InterpolationParams};

/// A resolved job together with the temporary directory holding its
/// frames. The directory is deleted when the outcome is dropped, so
/// outcomes must outlive stitching.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: InterpolationJob,
    pub temp_dir: Option<TempDir>,
}

/// Run one interpolation job per consecutive pair of the sequence.
///
/// Pairs share no state: each job reads its two source images and writes
/// into its own temporary directory. A failed or timed-out job is recorded
/// and skipped; it never aborts the rest. Results come back in pair order
/// regardless of `max_parallel`.
pub async fn run_jobs(
    sequence_paths: &[PathBuf],
    params: &InterpolationParams,
    interpolator: Arc<dyn FrameInterpolator>,
    max_parallel: usize,
    work_dir: &Path,
) -> std::io::Result<Vec<JobOutcome>> {
    tokio::fs::create_dir_all(work_dir).await?;

    let jobs: Vec<InterpolationJob> = sequence_paths
        .windows(2)
        .enumerate()
        .map(|(i, pair)| InterpolationJob::new(i, &pair[0], &pair[1], params.clone()))
        .collect();
    let total = jobs.len();

    let outcomes = if max_parallel <= 1 {
        let mut outcomes = Vec::with_capacity(total);
        for job in jobs {
            outcomes.push(run_single_job(job, interpolator.as_ref(), work_dir, total).await);
        }
        outcomes
    } else {
        let semaphore = Arc::new(Semaphore::new(max_parallel));
        let futures: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let interpolator = interpolator.clone();
                let semaphore = semaphore.clone();
                let work_dir = work_dir.to_path_buf();
                async move {
                    let permit = match semaphore.acquire_owned().await {
                        Ok(p) => p,
                        Err(_) => {
                            let mut job = job;
                            job.fail("worker pool closed", 0);
                            return JobOutcome { job, temp_dir: None };
                        }
                    };
                    let outcome =
                        run_single_job(job, interpolator.as_ref(), &work_dir, total).await;
                    drop(permit);
                    outcome
                }
            })
            .collect();
        join_all(futures).await
    };

    Ok(outcomes)
}

/// Resolve one job against the engine, in a dedicated temp directory.
async fn run_single_job(
    mut job: InterpolationJob,
    interpolator: &dyn FrameInterpolator,
    work_dir: &Path,
    total: usize,
) -> JobOutcome {
    let started = Instant::now();

    let temp_dir = match TempDir::new_in(work_dir) {
        Ok(dir) => dir,
        Err(e) => {
            warn!(
                pair = job.pair_index,
                error = %e,
                "failed to create job temp directory"
            );
            job.fail(
                format!("temp directory creation failed: {e}"),
                started.elapsed().as_millis() as u64,
            );
            return JobOutcome { job, temp_dir: None };
        }
    };

    match interpolator
        .run_pair(&job.image_a, &job.image_b, &job.params, temp_dir.path())
        .await
    {
        Ok(frames) => {
            let elapsed = started.elapsed().as_millis() as u64;
            info!(
                pair = job.pair_index + 1,
                total,
                frames = frames.len(),
                elapsed_ms = elapsed,
                "interpolation job complete"
            );
            job.succeed(frames, elapsed);
            JobOutcome { job, temp_dir: Some(temp_dir) }
        }
        Err(e) => {
            let elapsed = started.elapsed().as_millis() as u64;
            warn!(
                pair = job.pair_index + 1,
                total,
                error = %e,
                elapsed_ms = elapsed,
                "interpolation job failed, continuing with remaining pairs"
            );
            job.fail(e.to_string(), elapsed);
            JobOutcome { job, temp_dir: None }
        }
    }
}
