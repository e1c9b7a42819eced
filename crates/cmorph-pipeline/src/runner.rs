//! Pipeline driver: wire the stages into runnable operations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use cmorph_media::{EmbeddingProvider, FrameInterpolator};
use cmorph_models::{
    AnimationMetadata, Candidate, InterpolationParams, RunId, RunManifest, SelectionStrategy,
    SequenceManifest, StageTimings,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::filter::filter_candidates;
use crate::index::build_index;
use crate::orchestrator::run_jobs;
use crate::recorder::RunRecorder;
use crate::selector::select_sequence;
use crate::similarity::cosine_similarity_matrix;
use crate::stitcher::stitch;

/// Result of the selection half (sort-only mode).
#[derive(Debug)]
pub struct SelectionOutcome {
    /// Ordered source paths of the chosen sequence
    pub sequence_paths: Vec<PathBuf>,
    /// Manifest written next to the copied stills
    pub manifest: SequenceManifest,
    /// Every scanned candidate's metadata
    pub candidates: Vec<Candidate>,
    /// Candidates rejected by the quality filter
    pub rejected: usize,
}

/// Intermediate state shared by both pipeline operations.
struct SelectionStages {
    candidates: Vec<Candidate>,
    rejected: usize,
    embedded: usize,
    sequence_paths: Vec<PathBuf>,
    timings: StageTimings,
}

/// The animation pipeline.
///
/// Owns caller-provided handles for the two external engines, so tests
/// (and alternative deployments) can substitute implementations without
/// touching model weights or spawning processes.
pub struct AnimationPipeline {
    config: PipelineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    interpolator: Arc<dyn FrameInterpolator>,
}

impl AnimationPipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        interpolator: Arc<dyn FrameInterpolator>,
    ) -> Self {
        Self { config, embedder, interpolator }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filter, embed, and order the candidates.
    async fn choose(
        &self,
        paths: &[PathBuf],
        strategy: SelectionStrategy,
        count: Option<usize>,
    ) -> PipelineResult<SelectionStages> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let outcome = filter_candidates(paths, self.config.min_foreground_ratio);
        let mut candidates = outcome.candidates;
        let rejected = outcome.rejected;
        timings.filter_ms = started.elapsed().as_millis() as u64;
        info!(
            input = paths.len(),
            rejected,
            "quality filter complete"
        );

        let started = Instant::now();
        let index = build_index(&mut candidates, self.embedder.as_ref()).await;
        timings.embed_ms = started.elapsed().as_millis() as u64;
        info!(embedded = index.len(), "embedding index complete");

        let started = Instant::now();
        let similarity = cosine_similarity_matrix(&index.vectors);
        let order = select_sequence(
            &similarity,
            &index.vectors,
            count,
            strategy,
            self.config.diversity_weight,
        )?;
        timings.select_ms = started.elapsed().as_millis() as u64;

        let sequence_paths: Vec<PathBuf> =
            order.into_iter().map(|i| index.paths[i].clone()).collect();

        Ok(SelectionStages {
            candidates,
            rejected,
            embedded: index.len(),
            sequence_paths,
            timings,
        })
    }

    /// Sort-only mode: choose a sequence and persist it, without
    /// interpolation.
    pub async fn select(
        &self,
        paths: &[PathBuf],
        character: &str,
        strategy: SelectionStrategy,
        count: Option<usize>,
    ) -> PipelineResult<SelectionOutcome> {
        let stages = self.choose(paths, strategy, count).await?;

        let recorder = RunRecorder::new(&self.config.output_root);
        let manifest = recorder
            .record_sequence(character, strategy, stages.embedded, &stages.sequence_paths)
            .await?;

        Ok(SelectionOutcome {
            sequence_paths: stages.sequence_paths,
            manifest,
            candidates: stages.candidates,
            rejected: stages.rejected,
        })
    }

    /// Full run: selection, interpolation, stitching, recording.
    ///
    /// Per-pair engine failures degrade the output instead of aborting it;
    /// the returned manifest records exactly which pairs contributed.
    pub async fn animate(
        &self,
        paths: &[PathBuf],
        character: &str,
        output_name: &str,
        strategy: SelectionStrategy,
        count: Option<usize>,
        params: &InterpolationParams,
    ) -> PipelineResult<RunManifest> {
        let run_id = RunId::new();
        let run_started = Instant::now();
        info!(
            run_id = %run_id,
            character,
            output_name,
            input = paths.len(),
            "starting animation run"
        );

        let mut stages = self.choose(paths, strategy, count).await?;
        if stages.sequence_paths.len() < 2 {
            return Err(PipelineError::InsufficientCandidates(stages.sequence_paths.len()));
        }

        let recorder = RunRecorder::new(&self.config.output_root);
        recorder
            .record_sequence(character, strategy, stages.embedded, &stages.sequence_paths)
            .await?;

        let started = Instant::now();
        let outcomes = run_jobs(
            &stages.sequence_paths,
            params,
            self.interpolator.clone(),
            self.config.max_parallel_jobs,
            &self.config.work_dir,
        )
        .await?;
        stages.timings.interpolate_ms = started.elapsed().as_millis() as u64;

        let jobs: Vec<_> = outcomes.iter().map(|o| o.job.clone()).collect();

        let started = Instant::now();
        let animation_dir = recorder.animation_dir(character, output_name);
        let animation = stitch(
            &jobs,
            &animation_dir,
            self.config.fps,
            stages.sequence_paths.len(),
        )
        .await?;
        stages.timings.stitch_ms = started.elapsed().as_millis() as u64;

        // Job temp directories are only deleted once their frames are
        // safely copied into the animation directory.
        drop(outcomes);

        stages.timings.total_ms = run_started.elapsed().as_millis() as u64;
        let processing_time = run_started.elapsed().as_secs_f64();

        let sequence_names: Vec<String> = stages
            .sequence_paths
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            })
            .collect();

        let metadata = AnimationMetadata {
            character: character.to_string(),
            output_name: output_name.to_string(),
            source_images: sequence_names.clone(),
            total_frames: animation.total_frames,
            fps: animation.fps,
            duration_seconds: animation.duration_seconds,
            processing_time,
            exponent: params.exponent,
            interpolation_params: params.clone(),
        };

        let manifest = RunManifest {
            run_id: run_id.clone(),
            character: character.to_string(),
            output_name: output_name.to_string(),
            created_at: chrono::Utc::now(),
            strategy,
            input_count: paths.len(),
            rejected_count: stages.rejected,
            embedded_count: stages.embedded,
            failed_jobs: animation.failed_jobs(),
            total_frames: animation.total_frames,
            fps: animation.fps,
            duration_seconds: animation.duration_seconds,
            sequence: sequence_names,
            candidates: stages.candidates,
            jobs: animation.jobs.clone(),
            timings: stages.timings,
        };

        recorder.record_animation(&metadata, &manifest).await;

        info!(
            run_id = %run_id,
            character,
            output_name,
            input = manifest.input_count,
            rejected = manifest.rejected_count,
            embedded = manifest.embedded_count,
            jobs_ok = animation.successful_jobs(),
            jobs_failed = manifest.failed_jobs,
            total_frames = manifest.total_frames,
            duration_seconds = manifest.duration_seconds,
            "animation run complete"
        );
        Ok(manifest)
    }
}
