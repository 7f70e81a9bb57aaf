// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `classify`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainRunConfig;
use crate::ml::pipeline::PipelineConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the span classifier on a labelled JSON dataset
    Train(TrainArgs),

    /// Classify the spans of a JSON document export
    Classify(ClassifyArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled training dataset (JSON array of spans with labels)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Directory holding the model artifact (weights, manifest, tokenizer)
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Dataset used to bootstrap a fresh model when no artifact exists
    #[arg(long, default_value = "data/bootstrap_training.json")]
    pub bootstrap_dataset: String,

    /// Number of full passes over each training batch
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Records per training batch
    #[arg(long, default_value_t = 32)]
    pub window_size: usize,

    /// How many times the sampling strategy is repeated
    #[arg(long, default_value_t = 1)]
    pub rounds: usize,

    /// Sample one random window per round instead of walking
    /// the dataset in sequential windows
    #[arg(long, default_value_t = false)]
    pub randomized: bool,

    /// How fast the model learns — too high causes instability,
    /// too low causes slow convergence
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Maximum number of tokens per span text (fresh models only)
    #[arg(long, default_value_t = 64)]
    pub max_seq_len: usize,

    /// Width of the text embedding (fresh models only)
    #[arg(long, default_value_t = 256)]
    pub embedding_dim: usize,

    /// Upper bound on the built vocabulary (fresh models only)
    #[arg(long, default_value_t = 4096)]
    pub vocab_size: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainRunConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainRunConfig {
    fn from(a: TrainArgs) -> Self {
        let pipeline = PipelineConfig {
            artifact_dir:      a.artifact_dir,
            bootstrap_dataset: a.bootstrap_dataset,
            max_seq_len:       a.max_seq_len,
            embedding_dim:     a.embedding_dim,
            vocab_size:        a.vocab_size,
            lr:                a.lr,
            ..PipelineConfig::default()
        };
        TrainRunConfig {
            pipeline,
            dataset_path: a.dataset,
            epochs:       a.epochs,
            window_size:  a.window_size,
            rounds:       a.rounds,
            randomized:   a.randomized,
        }
    }
}

/// All arguments for the `classify` command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// JSON document export to classify
    #[arg(long)]
    pub document: PathBuf,

    /// First page to classify (inclusive; default: first page)
    #[arg(long)]
    pub from_page: Option<i64>,

    /// Last page to classify (inclusive; default: last page)
    #[arg(long)]
    pub to_page: Option<i64>,

    /// Directory holding the model artifact (same as used during training)
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Dataset used to bootstrap a fresh model when no artifact exists
    #[arg(long, default_value = "data/bootstrap_training.json")]
    pub bootstrap_dataset: String,
}

/// Classification only needs the pipeline settings.
impl From<ClassifyArgs> for PipelineConfig {
    fn from(a: ClassifyArgs) -> Self {
        PipelineConfig {
            artifact_dir:      a.artifact_dir,
            bootstrap_dataset: a.bootstrap_dataset,
            ..PipelineConfig::default()
        }
    }
}
