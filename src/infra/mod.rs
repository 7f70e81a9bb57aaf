// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns shared by the other layers:
//
//   artifact.rs    — the model artifact directory: manifest
//                    (architecture + scaler + format version)
//                    plus weights via Burn's CompactRecorder
//
//   vocab_store.rs — word-level vocabulary persistence as a
//                    HuggingFace-format tokenizer.json
//
//   metrics.rs     — per-training-step loss CSV appender
//
// Reference: Rust Book §7 (Modules), Burn Book §5 (Records)

/// Model artifact save/load: manifest + weights
pub mod artifact;

/// Tokenizer vocabulary build, save, and load
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
