// ============================================================
// Layer 4 — Training Dataset Loading
// ============================================================
// Reads a training dataset file — a JSON array of TrainingData
// records — and translates its string labels into class indices.
//
// Both steps fail BEFORE any training work happens, so a bad
// dataset never leaves the model half-updated:
//   - unreadable file / malformed JSON → DatasetLoad
//   - a label the transformer does not know → DatasetLoad,
//     naming the record index

use std::fs;
use std::path::Path;

use crate::domain::errors::PipelineError;
use crate::domain::featured_text::TrainingData;
use crate::domain::label::LabelTransformer;

/// Load a JSON training dataset file.
pub fn load_training_data(path: &Path) -> Result<Vec<TrainingData>, PipelineError> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::DatasetLoad {
        path:   path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let records: Vec<TrainingData> =
        serde_json::from_str(&raw).map_err(|e| PipelineError::DatasetLoad {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::debug!("Loaded {} training records from '{}'", records.len(), path.display());
    Ok(records)
}

/// Translate every record's label through the transformer.
/// The transformer is authoritative — an unknown label is a
/// dataset defect, not an occasion to grow the vocabulary.
pub fn translate_labels(
    records:     &[TrainingData],
    transformer: &LabelTransformer,
    path:        &Path,
) -> Result<Vec<usize>, PipelineError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            transformer
                .to_int(&record.label)
                .ok_or_else(|| PipelineError::DatasetLoad {
                    path:   path.to_path_buf(),
                    reason: format!("record {i}: unknown label '{}'", record.label),
                })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"[
        {"text": "Chapter 1", "size": 18.0, "flags": 20, "bbox": [10.0, 10.0, 200.0, 30.0], "page": 1, "label": "chapter_title"},
        {"text": "Once upon a time", "size": 11.0, "flags": 0, "bbox": [10.0, 40.0, 400.0, 55.0], "page": 1, "label": "main_text"}
    ]"#;

    #[test]
    fn loads_and_translates_a_valid_dataset() {
        let file = write_dataset(VALID);
        let records = load_training_data(file.path()).unwrap();
        assert_eq!(records.len(), 2);

        let transformer = LabelTransformer::default();
        let labels = translate_labels(&records, &transformer, file.path()).unwrap();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn malformed_json_fails_with_dataset_load() {
        let file = write_dataset("[{not json");
        let err = load_training_data(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad { .. }));
    }

    #[test]
    fn missing_field_fails_with_dataset_load() {
        // no "size" field
        let file = write_dataset(
            r#"[{"text": "x", "flags": 0, "bbox": [0,0,1,1], "page": 1, "label": "other"}]"#,
        );
        let err = load_training_data(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad { .. }));
    }

    #[test]
    fn unknown_label_names_the_record_index() {
        let file = write_dataset(
            r#"[
                {"text": "x", "size": 10.0, "flags": 0, "bbox": [0,0,1,1], "page": 1, "label": "main_text"},
                {"text": "y", "size": 10.0, "flags": 0, "bbox": [0,0,1,1], "page": 1, "label": "margin_note"}
            ]"#,
        );
        let records = load_training_data(file.path()).unwrap();
        let err = translate_labels(&records, &LabelTransformer::default(), file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("record 1"));
        assert!(msg.contains("margin_note"));
    }

    #[test]
    fn nonexistent_file_fails_with_dataset_load() {
        let err = load_training_data(Path::new("/nonexistent/train.json")).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad { .. }));
    }
}
