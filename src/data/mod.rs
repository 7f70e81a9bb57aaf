// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw span files and model-ready batches:
//
//   span file (JSON)
//       │
//       ▼
//   SpanSource        → extracts FeaturedText spans (page range)
//       │
//       ▼
//   load_training_data → labelled records from a dataset file
//       │
//       ▼
//   FeaturePreprocessor → (texts, normalized numeric matrix)
//       │
//       ▼
//   SamplingStrategy  → windowed / randomized training batches
//       │
//       ▼
//   training loop (Layer 5)
//
// Each module does exactly one step and is testable on its own.

/// Span extraction collaborator interface + JSON-file implementation
pub mod source;

/// Min-max feature scaling and batch preprocessing
pub mod preprocessor;

/// Training dataset file loading and label translation
pub mod dataset;

/// Windowed / randomized batch planning for training rounds
pub mod sampler;
