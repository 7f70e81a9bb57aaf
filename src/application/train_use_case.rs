// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Build the pipeline        (Layer 5 - ml)
//           — loads the persisted artifact, or bootstraps
//             a fresh model if none exists
//   Step 2: Pick the sampling strategy
//   Step 3: Train on the dataset      (Layer 5 - ml)
//           — the pipeline persists itself afterwards
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::sampler::SamplingStrategy;
use crate::ml::pipeline::{ClassifierPipeline, PipelineConfig};

// ─── Training Run Configuration ──────────────────────────────────────────────
// Everything one training run needs. Serialisable so a run can
// be described in a config file as well as on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRunConfig {
    pub pipeline:     PipelineConfig,
    pub dataset_path: PathBuf,
    pub epochs:       usize,
    pub window_size:  usize,
    pub rounds:       usize,
    /// true → one random sample per round; false → sequential windows
    pub randomized:   bool,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the run config and drives the pipeline through training.
pub struct TrainUseCase {
    config: TrainRunConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainRunConfig) -> Self {
        Self { config }
    }

    /// Execute the training run end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Build (or load) the pipeline ──────────────────────────────
        let mut pipeline = ClassifierPipeline::new(cfg.pipeline.clone())
            .context("Cannot initialise the classifier pipeline")?;

        // ── Step 2: Sampling strategy ─────────────────────────────────────────
        let strategy = if cfg.randomized {
            SamplingStrategy::Randomized { window_size: cfg.window_size }
        } else {
            SamplingStrategy::Windowed { window_size: cfg.window_size }
        };

        // ── Step 3: Train and persist ─────────────────────────────────────────
        pipeline
            .train_model(&cfg.dataset_path, cfg.epochs, strategy, cfg.rounds)
            .with_context(|| {
                format!("Training failed on '{}'", cfg.dataset_path.display())
            })?;

        tracing::info!("Training run complete; artifact updated");
        Ok(())
    }
}
