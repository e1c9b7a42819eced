//! Run recording: persist sequence stills and run manifests.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use cmorph_models::{
    AnimationMetadata, RunManifest, SelectionStrategy, SequenceEntry, SequenceManifest,
};

use crate::error::PipelineResult;

/// Persists run artifacts under a per-character output root.
///
/// Layout:
/// - `{character}/animation_sequence/frame_{0000..}.png` + `sequence_manifest.json`
/// - `{character}/animations/{name}/frame_{00000..}.png` + `metadata.json`
///   + `run_manifest.json`
#[derive(Debug, Clone)]
pub struct RunRecorder {
    output_root: PathBuf,
}

impl RunRecorder {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self { output_root: output_root.into() }
    }

    /// Directory holding the copied sequence stills for a character.
    pub fn sequence_dir(&self, character: &str) -> PathBuf {
        self.output_root.join(character).join("animation_sequence")
    }

    /// Directory holding one named animation for a character.
    pub fn animation_dir(&self, character: &str, output_name: &str) -> PathBuf {
        self.output_root
            .join(character)
            .join("animations")
            .join(output_name)
    }

    /// Copy the chosen stills into the sequence directory and write the
    /// sequence manifest.
    ///
    /// The copied frames are the deliverable of a sort-only run, so copy
    /// failures propagate; a manifest write failure is logged only.
    pub async fn record_sequence(
        &self,
        character: &str,
        strategy: SelectionStrategy,
        total_images: usize,
        sequence_paths: &[PathBuf],
    ) -> PipelineResult<SequenceManifest> {
        let dir = self.sequence_dir(character);
        tokio::fs::create_dir_all(&dir).await?;

        let mut entries = Vec::with_capacity(sequence_paths.len());
        for (index, source) in sequence_paths.iter().enumerate() {
            let dest = dir.join(format!("frame_{index:04}.png"));
            tokio::fs::copy(source, &dest).await?;
            entries.push(SequenceEntry {
                index,
                source: source
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: dest.to_string_lossy().to_string(),
            });
        }

        let manifest = SequenceManifest {
            character: character.to_string(),
            method: strategy.to_string(),
            total_images,
            selected_count: entries.len(),
            images: entries,
        };
        self.write_json(&dir.join("sequence_manifest.json"), &manifest)
            .await;

        info!(
            character,
            selected = manifest.selected_count,
            pool = total_images,
            "sequence recorded"
        );
        Ok(manifest)
    }

    /// Write the animation metadata and the full run manifest.
    ///
    /// Both writes are best-effort: a failure here never invalidates the
    /// stitched animation.
    pub async fn record_animation(&self, metadata: &AnimationMetadata, manifest: &RunManifest) {
        let dir = self.animation_dir(&metadata.character, &metadata.output_name);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "failed to create animation directory for manifests");
            return;
        }

        self.write_json(&dir.join("metadata.json"), metadata).await;
        self.write_json(&dir.join("run_manifest.json"), manifest).await;
    }

    /// Serialize and write one JSON artifact, logging (not propagating)
    /// failures.
    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) {
        let payload = match serde_json::to_vec_pretty(value) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to serialize manifest");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(path, payload).await {
            warn!(path = %path.display(), error = %e, "failed to write manifest");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_sequence_copies_and_manifests() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let mut sources = Vec::new();
        for name in ["pose_b.png", "pose_a.png", "pose_c.png"] {
            let path = input.path().join(name);
            tokio::fs::write(&path, name).await.unwrap();
            sources.push(path);
        }

        let recorder = RunRecorder::new(output.path());
        let manifest = recorder
            .record_sequence("hero", SelectionStrategy::Greedy, 5, &sources)
            .await
            .unwrap();

        assert_eq!(manifest.method, "greedy");
        assert_eq!(manifest.total_images, 5);
        assert_eq!(manifest.selected_count, 3);
        assert_eq!(manifest.images[1].source, "pose_a.png");

        let dir = recorder.sequence_dir("hero");
        for i in 0..3 {
            assert!(dir.join(format!("frame_{i:04}.png")).exists());
        }

        let raw = tokio::fs::read_to_string(dir.join("sequence_manifest.json"))
            .await
            .unwrap();
        let parsed: SequenceManifest = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.images.len(), 3);
        // Copy order follows sequence order, not name order.
        assert_eq!(parsed.images[0].source, "pose_b.png");
    }

    #[tokio::test]
    async fn test_record_animation_best_effort() {
        let output = TempDir::new().unwrap();
        let recorder = RunRecorder::new(output.path());

        let metadata = AnimationMetadata {
            character: "hero".to_string(),
            output_name: "walk".to_string(),
            source_images: vec!["a.png".to_string(), "b.png".to_string()],
            total_frames: 16,
            fps: 30,
            duration_seconds: 16.0 / 30.0,
            processing_time: 1.5,
            exponent: 4,
            interpolation_params: Default::default(),
        };
        let manifest = RunManifest {
            run_id: cmorph_models::RunId::new(),
            character: "hero".to_string(),
            output_name: "walk".to_string(),
            created_at: chrono::Utc::now(),
            strategy: SelectionStrategy::Greedy,
            input_count: 2,
            rejected_count: 0,
            embedded_count: 2,
            failed_jobs: 0,
            total_frames: 16,
            fps: 30,
            duration_seconds: 16.0 / 30.0,
            sequence: vec!["a.png".to_string(), "b.png".to_string()],
            candidates: Vec::new(),
            jobs: Vec::new(),
            timings: Default::default(),
        };

        recorder.record_animation(&metadata, &manifest).await;

        let dir = recorder.animation_dir("hero", "walk");
        assert!(dir.join("metadata.json").exists());
        assert!(dir.join("run_manifest.json").exists());

        let raw = tokio::fs::read_to_string(dir.join("metadata.json")).await.unwrap();
        let parsed: AnimationMetadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.total_frames, 16);
    }
}
