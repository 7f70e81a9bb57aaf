// ============================================================
// Layer 5 — Pipeline Controller
// ============================================================
// Owns the whole classifier lifecycle:
//
//   UNINITIALIZED ──construct──> READY
//     artifact on disk?  → load manifest, tokenizer, weights
//     no artifact?       → fresh model, fit scaler, bootstrap
//                          training pass, persist — all before
//                          construction returns
//
//   READY ──train_model──> READY   (mutates parameters)
//   READY ──predict──────> READY   (no mutation)
//   READY ──save─────────> READY
//
// Model and optimiser are sibling resources with one owner:
// constructed together, never shared. Optimiser state lives for
// the process only — a restart gets a fresh Adam bound to the
// loaded weights.
//
// Training runs on Autodiff<NdArray>; prediction uses
// model.valid() to drop onto the inner backend with no autodiff
// overhead.

use std::path::Path;

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset,
    preprocessor::{FeaturePreprocessor, MinMaxScaler},
    sampler::{self, SamplingStrategy},
};
use crate::domain::errors::PipelineError;
use crate::domain::featured_text::{FeaturedText, NUM_NUMERIC_FEATURES};
use crate::domain::label::{LabelTransformer, DEFAULT_LABELS};
use crate::infra::{
    artifact::{ArtifactManifest, ArtifactStore, ModelHyperparams, ARTIFACT_FORMAT_VERSION},
    metrics::{MetricsLogger, StepMetrics},
    vocab_store::VocabStore,
};
use crate::ml::{
    encoder::{self, TextEncoder},
    model::{SpanClassifierConfig, SpanClassifierModel},
    trainer::{self, TrainOptions, DEFAULT_LR},
};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
pub type InferBackend = burn::backend::NdArray;
type Device = burn::backend::ndarray::NdArrayDevice;
type PipelineOptimizer = OptimizerAdaptor<Adam, SpanClassifierModel<TrainBackend>, TrainBackend>;

// ─── Pipeline Configuration ───────────────────────────────────────────────────
/// Construction-time settings. Architecture values only apply to
/// a FRESH pipeline — a loaded artifact's manifest wins, since
/// the persisted weights fix the architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding weights, manifest, and tokenizer
    pub artifact_dir: String,
    /// Dataset used for the bootstrap training pass of a fresh model
    pub bootstrap_dataset: String,
    /// Token budget per span text
    pub max_seq_len: usize,
    /// Width of the text branch's pooled embedding
    pub embedding_dim: usize,
    /// Upper bound on the built vocabulary (including specials)
    pub vocab_size: usize,
    /// Adam learning rate
    pub lr: f64,
    /// Epochs per training step during the bootstrap pass
    pub bootstrap_epochs: usize,
    /// Window size of the bootstrap pass
    pub bootstrap_window: usize,
    /// Ordered label vocabulary — fixes class index meaning
    pub labels: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_dir:      "artifacts".to_string(),
            bootstrap_dataset: "data/bootstrap_training.json".to_string(),
            max_seq_len:       64,
            embedding_dim:     256,
            vocab_size:        4096,
            lr:                DEFAULT_LR,
            bootstrap_epochs:  5,
            bootstrap_window:  32,
            labels:            DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ─── ClassifierPipeline ───────────────────────────────────────────────────────
pub struct ClassifierPipeline {
    config:      PipelineConfig,
    device:      Device,
    labels:      LabelTransformer,
    encoder:     TextEncoder,
    scaler:      MinMaxScaler,
    hyperparams: ModelHyperparams,
    model:       SpanClassifierModel<TrainBackend>,
    optim:       PipelineOptimizer,
    artifacts:   ArtifactStore,
    metrics:     MetricsLogger,
    /// Running training-step counter for the metrics log
    steps_done:  usize,
}

impl ClassifierPipeline {
    /// Construct the pipeline. Loads the persisted artifact if
    /// one exists; otherwise initialises a fresh model, runs the
    /// bootstrap training pass, and persists it before returning.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let device = Device::default();
        let artifacts = ArtifactStore::new(&config.artifact_dir);
        let metrics = MetricsLogger::new(&config.artifact_dir);

        if artifacts.model_exists() {
            Self::load(config, device, artifacts, metrics)
        } else {
            Self::bootstrap(config, device, artifacts, metrics)
        }
    }

    /// READY (loaded): rebuild from manifest + weights, no training.
    fn load(
        config:    PipelineConfig,
        device:    Device,
        artifacts: ArtifactStore,
        metrics:   MetricsLogger,
    ) -> Result<Self, PipelineError> {
        let manifest = artifacts.load_manifest()?;
        if manifest.labels.len() != manifest.model.num_classes {
            return Err(PipelineError::ModelIo {
                path:   artifacts.dir().to_path_buf(),
                reason: format!(
                    "manifest lists {} labels for {} classes",
                    manifest.labels.len(),
                    manifest.model.num_classes
                ),
            });
        }

        let labels = LabelTransformer::new(manifest.labels.clone());
        let tokenizer = VocabStore::new(artifacts.dir()).load()?;
        let encoder = TextEncoder::new(tokenizer, manifest.model.max_seq_len);

        let model_config = SpanClassifierConfig::new(
            manifest.model.vocab_size,
            manifest.model.max_seq_len,
            manifest.model.embedding_dim,
            manifest.model.num_numeric_features,
            manifest.model.num_classes,
        );
        let model = model_config.init::<TrainBackend>(&device);
        let model = artifacts.load_model(model, &device)?;
        let optim = AdamConfig::new().with_epsilon(1e-8).init();

        tracing::info!(
            "Loaded pipeline from '{}' ({} classes, vocab {})",
            artifacts.dir().display(),
            manifest.model.num_classes,
            manifest.model.vocab_size,
        );

        Ok(Self {
            config,
            device,
            labels,
            encoder,
            scaler: manifest.scaler.clone(),
            hyperparams: manifest.model,
            model,
            optim,
            artifacts,
            metrics,
            steps_done: 0,
        })
    }

    /// READY (fresh): build vocabulary and scaler from the
    /// bootstrap dataset, train once, persist.
    fn bootstrap(
        config:    PipelineConfig,
        device:    Device,
        artifacts: ArtifactStore,
        metrics:   MetricsLogger,
    ) -> Result<Self, PipelineError> {
        tracing::info!(
            "No artifact at '{}' — bootstrapping a fresh model",
            artifacts.dir().display()
        );

        let dataset_path = Path::new(&config.bootstrap_dataset).to_path_buf();
        let records = dataset::load_training_data(&dataset_path)?;
        let labels = LabelTransformer::new(config.labels.clone());
        let label_ids = dataset::translate_labels(&records, &labels, &dataset_path)?;

        // Vocabulary from the bootstrap corpus
        let corpus: Vec<String> = records.iter().map(|r| r.span.text.clone()).collect();
        let tokenizer = VocabStore::new(artifacts.dir()).build_and_save(&corpus, config.vocab_size)?;
        let encoder = TextEncoder::new(tokenizer, config.max_seq_len);

        // The one and only scaler fit of this model's lifetime
        let spans: Vec<FeaturedText> = records.iter().map(|r| r.span.clone()).collect();
        let (texts, matrix, scaler) = FeaturePreprocessor::preprocess_fit(&spans)?;

        let hyperparams = ModelHyperparams {
            vocab_size:           encoder.vocab_size(),
            max_seq_len:          config.max_seq_len,
            embedding_dim:        config.embedding_dim,
            num_numeric_features: NUM_NUMERIC_FEATURES,
            num_classes:          labels.num_classes(),
        };
        let model = SpanClassifierConfig::new(
            hyperparams.vocab_size,
            hyperparams.max_seq_len,
            hyperparams.embedding_dim,
            hyperparams.num_numeric_features,
            hyperparams.num_classes,
        )
        .init::<TrainBackend>(&device);
        let optim = AdamConfig::new().with_epsilon(1e-8).init();

        let mut pipeline = Self {
            config: config.clone(),
            device,
            labels,
            encoder,
            scaler,
            hyperparams,
            model,
            optim,
            artifacts,
            metrics,
            steps_done: 0,
        };

        pipeline.run_rounds(
            &texts,
            &matrix,
            &label_ids,
            config.bootstrap_epochs,
            SamplingStrategy::Windowed { window_size: config.bootstrap_window },
            1,
        )?;
        pipeline.save()?;

        tracing::info!("Bootstrap training complete; artifact persisted");
        Ok(pipeline)
    }

    pub fn num_classes(&self) -> usize {
        self.hyperparams.num_classes
    }

    pub fn labels(&self) -> &LabelTransformer {
        &self.labels
    }

    // ── Prediction ───────────────────────────────────────────────────────────

    /// Classify a preprocessed batch. Returns one class index in
    /// `[0, num_classes)` per row. Never mutates model or
    /// optimiser state.
    pub fn predict(
        &self,
        texts:  &[String],
        matrix: &[Vec<f32>],
    ) -> Result<Vec<usize>, PipelineError> {
        if texts.len() != matrix.len() {
            return Err(PipelineError::inconsistent_batch(texts.len(), matrix.len()));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for (index, row) in matrix.iter().enumerate() {
            if row.len() != NUM_NUMERIC_FEATURES {
                return Err(PipelineError::InvalidFeature {
                    index,
                    field:  "numeric_features",
                    reason: format!(
                        "expected {NUM_NUMERIC_FEATURES} columns, got {}",
                        row.len()
                    ),
                });
            }
        }

        let encoded = self.encoder.encode_batch(texts)?;
        let (token_ids, pad_mask) = encoded.to_tensors::<InferBackend>(&self.device);
        let numeric = encoder::numeric_tensor::<InferBackend>(matrix, &self.device);

        // Inner-backend copy of the model — no gradient tracking
        let model = self.model.valid();
        let logits = model.forward(token_ids, pad_mask, numeric);

        // argmax(1) returns [batch, 1]; flatten to [batch]
        let predictions: Vec<i64> = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .to_vec::<i64>()
            .map_err(|e| PipelineError::InvalidFeature {
                index:  0,
                field:  "prediction",
                reason: format!("cannot read class indices: {e:?}"),
            })?;

        // One class index per input row, always
        if predictions.len() != texts.len() {
            return Err(PipelineError::ShapeMismatch {
                operation: "prediction readout",
                expected:  texts.len(),
                actual:    predictions.len(),
            });
        }

        Ok(predictions.into_iter().map(|p| p as usize).collect())
    }

    /// Preprocess raw spans with the stored scaler and classify.
    pub fn classify(&self, spans: &[FeaturedText]) -> Result<Vec<usize>, PipelineError> {
        let (texts, matrix) = FeaturePreprocessor::preprocess(spans, &self.scaler)?;
        self.predict(&texts, &matrix)
    }

    // ── Training ─────────────────────────────────────────────────────────────

    /// Train on a JSON dataset file, then persist.
    ///
    /// The strategy picks the batches of each round; `rounds`
    /// repeats the strategy. A failure mid-run aborts the
    /// remaining rounds but keeps completed steps' updates.
    pub fn train_model(
        &mut self,
        dataset_path: &Path,
        epochs:       usize,
        strategy:     SamplingStrategy,
        rounds:       usize,
    ) -> Result<(), PipelineError> {
        let records = dataset::load_training_data(dataset_path)?;
        let label_ids = dataset::translate_labels(&records, &self.labels, dataset_path)?;

        let spans: Vec<FeaturedText> = records.iter().map(|r| r.span.clone()).collect();
        let (texts, matrix) = FeaturePreprocessor::preprocess(&spans, &self.scaler)?;

        tracing::info!(
            "Training on {} records: {:?}, {} round(s), {} epoch(s) per step",
            records.len(),
            strategy,
            rounds,
            epochs,
        );

        self.run_rounds(&texts, &matrix, &label_ids, epochs, strategy, rounds)?;
        self.save()
    }

    /// Drive the sampling rounds over an already-preprocessed
    /// dataset. One loop body serves both strategies.
    fn run_rounds(
        &mut self,
        texts:    &[String],
        matrix:   &[Vec<f32>],
        labels:   &[usize],
        epochs:   usize,
        strategy: SamplingStrategy,
        rounds:   usize,
    ) -> Result<(), PipelineError> {
        if epochs == 0 {
            return Err(PipelineError::ShapeMismatch {
                operation: "training epochs",
                expected:  1,
                actual:    0,
            });
        }
        trainer::check_shapes(texts.len(), matrix.len(), labels.len())?;

        let mut rng = rand::thread_rng();

        for round in 1..=rounds {
            for indices in sampler::plan_round(strategy, texts.len(), &mut rng)? {
                let batch_texts: Vec<String> =
                    indices.iter().map(|&i| texts[i].clone()).collect();
                let batch_matrix: Vec<Vec<f32>> =
                    indices.iter().map(|&i| matrix[i].clone()).collect();
                let batch_labels: Vec<i32> =
                    indices.iter().map(|&i| labels[i] as i32).collect();

                let encoded = self.encoder.encode_batch(&batch_texts)?;
                let (token_ids, pad_mask) = encoded.to_tensors::<TrainBackend>(&self.device);
                let numeric = encoder::numeric_tensor::<TrainBackend>(&batch_matrix, &self.device);
                let label_tensor =
                    Tensor::<TrainBackend, 1, Int>::from_ints(batch_labels.as_slice(), &self.device);

                let opts = TrainOptions { epochs, lr: self.config.lr, round };
                let (model, loss) = trainer::train_batch(
                    self.model.clone(),
                    &mut self.optim,
                    token_ids,
                    pad_mask,
                    numeric,
                    label_tensor,
                    &opts,
                )?;
                self.model = model;
                self.steps_done += 1;

                let step = StepMetrics {
                    round,
                    step: self.steps_done,
                    size: indices.len(),
                    loss,
                };
                if let Err(e) = self.metrics.log_step(&step) {
                    tracing::warn!("Metrics append failed: {e:#}");
                }
            }
        }

        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    /// Persist manifest + weights, overwriting the existing
    /// artifact. The in-memory pipeline is untouched on failure.
    pub fn save(&self) -> Result<(), PipelineError> {
        let manifest = ArtifactManifest {
            format_version: ARTIFACT_FORMAT_VERSION,
            model:  self.hyperparams.clone(),
            scaler: self.scaler.clone(),
            labels: self.labels.labels().to_vec(),
        };
        self.artifacts.save_manifest(&manifest)?;
        self.artifacts.save_model(&self.model)?;
        tracing::debug!("Pipeline saved to '{}'", self.artifacts.dir().display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::featured_text::TrainingData;
    use std::path::PathBuf;

    fn write_bootstrap(path: &Path) {
        let labels = [
            "chapter_title", "main_text", "annotation", "header",
            "footer", "other", "epigraph", "main_text",
        ];
        let records: Vec<TrainingData> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| TrainingData {
                span: FeaturedText::new(
                    format!("span text number {i} for {label}"),
                    8.0 + i as f32,
                    (i % 4) as i64,
                    [0.0, 10.0 * i as f32, 100.0, 10.0 * i as f32 + 12.0],
                    (i / 3 + 1) as i64,
                ),
                label: label.to_string(),
            })
            .collect();
        std::fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
    }

    fn test_config(dir: &Path) -> (PipelineConfig, PathBuf) {
        let dataset = dir.join("bootstrap.json");
        write_bootstrap(&dataset);
        let config = PipelineConfig {
            artifact_dir:      dir.join("artifacts").to_string_lossy().into_owned(),
            bootstrap_dataset: dataset.to_string_lossy().into_owned(),
            max_seq_len:       12,
            embedding_dim:     16,
            vocab_size:        128,
            lr:                1e-3,
            bootstrap_epochs:  1,
            bootstrap_window:  4,
            ..PipelineConfig::default()
        };
        (config, dataset)
    }

    fn sample_batch() -> (Vec<String>, Vec<Vec<f32>>) {
        let texts = vec![
            "span text number 1".to_string(),
            "completely unseen words".to_string(),
            "span text".to_string(),
        ];
        let matrix = vec![vec![0.2f32; 7], vec![0.8f32; 7], vec![0.5f32; 7]];
        (texts, matrix)
    }

    #[test]
    fn fresh_construction_trains_and_persists_then_reload_matches() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = test_config(dir.path());

        // Fresh path: artifact must exist once construction returns
        let p1 = ClassifierPipeline::new(config.clone()).unwrap();
        let weights = dir.path().join("artifacts").join("model.mpk.gz");
        assert!(weights.exists());
        assert!(dir.path().join("artifacts").join("pipeline.json").exists());
        assert!(dir.path().join("artifacts").join("tokenizer.json").exists());

        let (texts, matrix) = sample_batch();
        let before = p1.predict(&texts, &matrix).unwrap();

        // Loaded path: no training, identical predictions
        let p2 = ClassifierPipeline::new(config).unwrap();
        let after = p2.predict(&texts, &matrix).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn predictions_are_valid_class_indices() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = test_config(dir.path());
        let pipeline = ClassifierPipeline::new(config).unwrap();

        let (texts, matrix) = sample_batch();
        let predictions = pipeline.predict(&texts, &matrix).unwrap();

        assert_eq!(predictions.len(), 3);
        assert!(predictions.iter().all(|&p| p < pipeline.num_classes()));

        // Exactly one index per input row, for any batch size
        for rows in 1..=3 {
            let predictions = pipeline
                .predict(&texts[..rows], &matrix[..rows])
                .unwrap();
            assert_eq!(predictions.len(), rows);
        }
    }

    #[test]
    fn predict_rejects_inconsistent_batches() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = test_config(dir.path());
        let pipeline = ClassifierPipeline::new(config).unwrap();

        let err = pipeline
            .predict(&["a".to_string(), "b".to_string()], &[vec![0.0; 7]])
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFeature { .. }));

        let err = pipeline
            .predict(&["a".to_string()], &[vec![0.0; 3]])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidFeature { field: "numeric_features", .. }
        ));
    }

    #[test]
    fn classify_runs_raw_spans_through_the_stored_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = test_config(dir.path());
        let pipeline = ClassifierPipeline::new(config).unwrap();

        let spans = vec![
            FeaturedText::new("Chapter Two", 18.0, 20, [10.0, 10.0, 200.0, 30.0], 1),
            FeaturedText::new("body text", 11.0, 0, [10.0, 40.0, 400.0, 55.0], 2),
        ];
        let predictions = pipeline.classify(&spans).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|&p| p < pipeline.num_classes()));
    }

    #[test]
    fn windowed_training_issues_one_step_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let (config, dataset) = test_config(dir.path());
        let mut pipeline = ClassifierPipeline::new(config).unwrap();

        // Bootstrap logged ceil(8/4) = 2 steps already
        pipeline
            .train_model(&dataset, 1, SamplingStrategy::Windowed { window_size: 3 }, 2)
            .unwrap();

        // + 2 rounds × ceil(8/3) = 6 steps → header + 8 rows
        let body = std::fs::read_to_string(
            dir.path().join("artifacts").join("metrics.csv"),
        )
        .unwrap();
        assert_eq!(body.lines().count(), 9);
    }

    #[test]
    fn randomized_training_issues_one_step_per_round() {
        let dir = tempfile::tempdir().unwrap();
        let (config, dataset) = test_config(dir.path());
        let mut pipeline = ClassifierPipeline::new(config).unwrap();

        pipeline
            .train_model(&dataset, 1, SamplingStrategy::Randomized { window_size: 4 }, 3)
            .unwrap();

        // bootstrap 2 steps + 3 randomized rounds → header + 5 rows
        let body = std::fs::read_to_string(
            dir.path().join("artifacts").join("metrics.csv"),
        )
        .unwrap();
        assert_eq!(body.lines().count(), 6);
    }

    #[test]
    fn bad_dataset_fails_before_touching_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = test_config(dir.path());
        let mut pipeline = ClassifierPipeline::new(config).unwrap();

        let (texts, matrix) = sample_batch();
        let before = pipeline.predict(&texts, &matrix).unwrap();

        let bad = dir.path().join("bad.json");
        std::fs::write(
            &bad,
            r#"[{"text": "x", "size": 1.0, "flags": 0, "bbox": [0,0,1,1], "page": 1, "label": "not_a_label"}]"#,
        )
        .unwrap();

        let err = pipeline
            .train_model(&bad, 1, SamplingStrategy::Windowed { window_size: 2 }, 1)
            .unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad { .. }));

        // Model unchanged — predictions identical
        let after = pipeline.predict(&texts, &matrix).unwrap();
        assert_eq!(before, after);
    }
}
