//! Animation pipeline worker binary.
//!
//! Env-driven host for the pipeline: no argument parsing, everything
//! comes from `CMORPH_*` variables (see `PipelineConfig::from_env`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cmorph_media::{CommandEmbedder, EngineInterpolator};
use cmorph_models::{AlphaMode, InterpolationParams, SelectionStrategy};
use cmorph_pipeline::{AnimationPipeline, PipelineConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("cmorph=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting cmorph-pipeline");

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("Pipeline error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: PipelineConfig) -> anyhow::Result<()> {
    let input_dir = std::env::var("CMORPH_INPUT_DIR")
        .map(PathBuf::from)
        .context("CMORPH_INPUT_DIR is required")?;
    let character = std::env::var("CMORPH_CHARACTER").unwrap_or_else(|_| "character".to_string());
    let output_name = std::env::var("CMORPH_OUTPUT_NAME").unwrap_or_else(|_| "animation".to_string());
    let mode = std::env::var("CMORPH_MODE").unwrap_or_else(|_| "animate".to_string());

    let strategy = match std::env::var("CMORPH_STRATEGY") {
        Ok(raw) => SelectionStrategy::from_str(&raw)?,
        Err(_) => SelectionStrategy::default(),
    };
    let count: Option<usize> = std::env::var("CMORPH_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&c| c > 0);

    let params = interpolation_params_from_env()?;

    let paths = scan_input_dir(&input_dir)
        .with_context(|| format!("failed to scan {}", input_dir.display()))?;
    info!(input = paths.len(), dir = %input_dir.display(), "scanned input stills");

    let embedder = Arc::new(
        CommandEmbedder::new(&config.embed_bin)
            .with_model_dir(&config.model_dir)
            .with_timeout(config.embed_timeout_secs),
    );
    embedder.check().context("embedding binary unavailable")?;

    let interpolator = Arc::new(
        EngineInterpolator::new(&config.engine_bin, &config.model_dir)
            .with_timeout(config.engine_timeout_secs),
    );
    if mode == "animate" {
        // Fail fast on a missing engine before any job is dispatched.
        interpolator
            .check()
            .context("interpolation engine unavailable")?;
    }

    let pipeline = AnimationPipeline::new(config, embedder, interpolator);

    match mode.as_str() {
        "select" => {
            let outcome = pipeline
                .select(&paths, &character, strategy, count)
                .await?;
            info!(
                selected = outcome.sequence_paths.len(),
                rejected = outcome.rejected,
                "selection run complete"
            );
        }
        "animate" => {
            let manifest = pipeline
                .animate(&paths, &character, &output_name, strategy, count, &params)
                .await?;
            info!(
                total_frames = manifest.total_frames,
                failed_jobs = manifest.failed_jobs,
                duration_seconds = manifest.duration_seconds,
                "worker finished"
            );
        }
        other => anyhow::bail!("unknown CMORPH_MODE: {other} (expected select|animate)"),
    }

    Ok(())
}

/// PNG stills in the input directory, sorted by name for determinism.
fn scan_input_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn interpolation_params_from_env() -> anyhow::Result<InterpolationParams> {
    let defaults = InterpolationParams::default();
    let alpha_mode = match std::env::var("CMORPH_ALPHA_MODE") {
        Ok(raw) => AlphaMode::from_str(&raw)?,
        Err(_) => defaults.alpha_mode,
    };
    Ok(InterpolationParams {
        exponent: env_parse("CMORPH_EXPONENT", defaults.exponent),
        scale: env_parse("CMORPH_SCALE", defaults.scale),
        alpha_mode,
        black_threshold: env_parse("CMORPH_BLACK_THRESHOLD", defaults.black_threshold),
        feather: env_parse("CMORPH_FEATHER", defaults.feather),
    })
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
