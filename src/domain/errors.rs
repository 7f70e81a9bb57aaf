// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure mode of the classification pipeline, as a typed
// enum. The core layers return these directly; the application
// layer wraps them in anyhow with extra context for the CLI.
//
// Propagation policy: errors surface to the immediate caller
// with the operation name and the offending index/field. There
// is no silent recovery and no rollback — a failed training
// round keeps earlier rounds' parameter updates and aborts the
// rest.
//
// Reference: Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or dimensionally inconsistent span input to
    /// preprocessing or the model forward pass
    #[error("invalid feature in span {index} ({field}): {reason}")]
    InvalidFeature {
        index:  usize,
        field:  &'static str,
        reason: String,
    },

    /// Label count vs. batch size mismatch in training
    #[error("shape mismatch in {operation}: expected {expected}, got {actual}")]
    ShapeMismatch {
        operation: &'static str,
        expected:  usize,
        actual:    usize,
    },

    /// Numerical failure during a training step (e.g. NaN loss)
    #[error("training failed at round {round}, epoch {epoch}: {reason}")]
    Training {
        round:  usize,
        epoch:  usize,
        reason: String,
    },

    /// Failure to load or save the model artifact. The in-memory
    /// model is left untouched.
    #[error("model artifact {path:?}: {reason}")]
    ModelIo {
        path:   PathBuf,
        reason: String,
    },

    /// Malformed training dataset file — fails before any
    /// training step executes
    #[error("training dataset {path:?}: {reason}")]
    DatasetLoad {
        path:   PathBuf,
        reason: String,
    },
}

impl PipelineError {
    /// Batch-level shape inconsistency between the text list and
    /// the numeric matrix handed to predict
    pub fn inconsistent_batch(texts: usize, rows: usize) -> Self {
        Self::InvalidFeature {
            index:  0,
            field:  "batch",
            reason: format!("{texts} text spans but {rows} numeric feature rows"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_index_and_field() {
        let err = PipelineError::InvalidFeature {
            index:  4,
            field:  "size",
            reason: "not finite".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("span 4"));
        assert!(msg.contains("size"));
    }

    #[test]
    fn dataset_errors_carry_the_path() {
        let err = PipelineError::DatasetLoad {
            path:   PathBuf::from("data/train.json"),
            reason: "expected value at line 1".into(),
        };
        assert!(err.to_string().contains("data/train.json"));
    }
}
