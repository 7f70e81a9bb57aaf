// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores the full pipeline artifact. One directory
// holds everything a later process needs to rebuild the exact
// pipeline:
//
//   artifacts/
//     model.mpk.gz    ← weights (NamedMpkGzFileRecorder:
//                       MessagePack + gzip, type-safe on load)
//     pipeline.json   ← manifest: format version, architecture
//                       hyperparameters, fitted scaler min/max,
//                       label vocabulary
//     tokenizer.json  ← word-level vocabulary (vocab_store)
//
// Why a manifest next to the weights?
//   The weights alone cannot reconstruct the model — the loader
//   must first build a model of the exact same architecture.
//   The manifest carries those hyperparameters, plus a format
//   version so an incompatible artifact fails loudly instead of
//   loading garbage.
//
// Optimizer state is deliberately NOT part of the artifact —
// every process builds a fresh Adam against the loaded model.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::fs;
use std::path::{Path, PathBuf};

use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::MinMaxScaler;
use crate::domain::errors::PipelineError;
use crate::domain::featured_text::NUM_NUMERIC_FEATURES;
use crate::ml::model::SpanClassifierModel;

/// Bumped whenever the manifest layout or model architecture
/// changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "pipeline.json";
const WEIGHTS_STEM: &str = "model";

/// Architecture hyperparameters, fixed for a model's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHyperparams {
    pub vocab_size:           usize,
    pub max_seq_len:          usize,
    pub embedding_dim:        usize,
    pub num_numeric_features: usize,
    pub num_classes:          usize,
}

/// Everything except the weights and the tokenizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub model:  ModelHyperparams,
    pub scaler: MinMaxScaler,
    pub labels: Vec<String>,
}

/// Manages one artifact directory.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store; the directory is created lazily on save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn weights_path(&self) -> PathBuf {
        // NamedMpkGzFileRecorder appends its own .mpk.gz extension
        self.dir.join(WEIGHTS_STEM)
    }

    fn weights_file(&self) -> PathBuf {
        self.dir.join(format!("{WEIGHTS_STEM}.mpk.gz"))
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// A persisted model exists iff the weights file does —
    /// this is the fresh-vs-loaded decision at construction.
    pub fn model_exists(&self) -> bool {
        self.weights_file().exists()
    }

    /// Serialise model weights, overwriting any existing artifact.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model: &SpanClassifierModel<B>,
    ) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).ok();
        let path = self.weights_path();

        NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| PipelineError::ModelIo {
                path:   self.weights_file(),
                reason: format!("cannot save weights: {e}"),
            })?;

        tracing::debug!("Saved model weights to '{}'", self.weights_file().display());
        Ok(())
    }

    /// Restore weights into a freshly built model of the same
    /// architecture. Loading fails if the architectures differ.
    pub fn load_model<B: Backend>(
        &self,
        model:  SpanClassifierModel<B>,
        device: &B::Device,
    ) -> Result<SpanClassifierModel<B>, PipelineError> {
        let record = NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .load(self.weights_path(), device)
            .map_err(|e| PipelineError::ModelIo {
                path:   self.weights_file(),
                reason: format!("cannot load weights: {e}"),
            })?;

        Ok(model.load_record(record))
    }

    /// Write the manifest JSON next to the weights.
    pub fn save_manifest(&self, manifest: &ArtifactManifest) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).ok();
        let path = self.manifest_path();

        let body = serde_json::to_string_pretty(manifest).map_err(|e| {
            PipelineError::ModelIo { path: path.clone(), reason: e.to_string() }
        })?;
        fs::write(&path, body).map_err(|e| PipelineError::ModelIo {
            path:   path.clone(),
            reason: format!("cannot write manifest: {e}"),
        })?;

        tracing::debug!("Saved manifest to '{}'", path.display());
        Ok(())
    }

    /// Read and validate the manifest. An unknown format version
    /// or a wrong numeric-feature count is an incompatible
    /// artifact, surfaced as ModelIo rather than undefined
    /// behaviour at forward time.
    pub fn load_manifest(&self) -> Result<ArtifactManifest, PipelineError> {
        let path = self.manifest_path();

        let raw = fs::read_to_string(&path).map_err(|e| PipelineError::ModelIo {
            path:   path.clone(),
            reason: format!("cannot read manifest: {e}"),
        })?;
        let manifest: ArtifactManifest =
            serde_json::from_str(&raw).map_err(|e| PipelineError::ModelIo {
                path:   path.clone(),
                reason: format!("malformed manifest: {e}"),
            })?;

        if manifest.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::ModelIo {
                path,
                reason: format!(
                    "unsupported artifact format version {} (expected {})",
                    manifest.format_version, ARTIFACT_FORMAT_VERSION
                ),
            });
        }
        if manifest.model.num_numeric_features != NUM_NUMERIC_FEATURES {
            return Err(PipelineError::ModelIo {
                path,
                reason: format!(
                    "artifact expects {} numeric features, this build uses {}",
                    manifest.model.num_numeric_features, NUM_NUMERIC_FEATURES
                ),
            });
        }
        // A scaler narrower than the feature count would index out
        // of bounds at transform time — reject it here instead.
        if manifest.scaler.num_features() != manifest.model.num_numeric_features {
            return Err(PipelineError::ModelIo {
                path,
                reason: format!(
                    "scaler covers {} features, model expects {}",
                    manifest.scaler.num_features(),
                    manifest.model.num_numeric_features
                ),
            });
        }

        Ok(manifest)
    }
}
