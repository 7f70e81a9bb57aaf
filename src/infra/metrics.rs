// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training step (one window or one
// randomized sample) so training runs leave a plottable record.
//
// Columns:
//   round — sampling round number (1-based)
//   step  — training-step number within the run (1-based)
//   size  — number of records in the batch
//   loss  — final-epoch cross-entropy loss for the batch
//
// Output file: {artifact_dir}/metrics.csv
//
// Metrics are best-effort: a failed append is the caller's to
// log and ignore, never a reason to abort training.

use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const METRICS_FILE: &str = "metrics.csv";

/// One row of the training metrics log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    pub round: usize,
    pub step:  usize,
    pub size:  usize,
    pub loss:  f64,
}

pub struct MetricsLogger {
    path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { path: dir.into().join(METRICS_FILE) }
    }

    /// Append one step's metrics, writing the header first if
    /// the file is new.
    pub fn log_step(&self, metrics: &StepMetrics) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let is_new = !self.path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open metrics file '{}'", self.path.display()))?;

        if is_new {
            writeln!(file, "round,step,size,loss")?;
        }
        writeln!(
            file,
            "{},{},{},{:.6}",
            metrics.round, metrics.step, metrics.size, metrics.loss
        )?;

        Ok(())
    }
}
