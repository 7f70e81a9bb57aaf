// ============================================================
// Layer 3 — Label Transformer
// ============================================================
// Bidirectional mapping between human-readable span labels and
// integer class indices. The classifier only ever sees indices;
// this mapping is the single authority for what they mean —
// the pipeline never invents labels of its own.
//
// Reference: Rust Book §8 (HashMaps)

use std::collections::HashMap;

/// The default label vocabulary for document span classification.
/// Index order is load-bearing: it fixes the class index each
/// label maps to, and therefore the meaning of every model output.
pub const DEFAULT_LABELS: &[&str] = &[
    "chapter_title",
    "main_text",
    "annotation",
    "other",
    "header",
    "footer",
    "epigraph",
];

/// Maps label strings to class indices in `[0, num_classes)` and back.
#[derive(Debug, Clone)]
pub struct LabelTransformer {
    /// Index → label, in declaration order
    labels: Vec<String>,
    /// Label → index, derived from `labels`
    index: HashMap<String, usize>,
}

impl LabelTransformer {
    /// Build a transformer from an ordered label vocabulary.
    /// Duplicate labels keep their first index.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            index.entry(label.clone()).or_insert(i);
        }
        Self { labels, index }
    }

    /// Class index for a label string, or None for an unknown label.
    pub fn to_int(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Label string for a class index, or None if out of range.
    pub fn to_label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of classes in the vocabulary
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// The ordered label vocabulary — persisted in the artifact
    /// manifest so a reloaded model keeps the same index meaning
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for LabelTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS.iter().copied())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_default_label() {
        let t = LabelTransformer::default();
        for label in DEFAULT_LABELS {
            let idx = t.to_int(label).unwrap();
            assert_eq!(t.to_label(idx), Some(*label));
        }
    }

    #[test]
    fn unknown_label_maps_to_none() {
        let t = LabelTransformer::default();
        assert_eq!(t.to_int("paragraph"), None);
        assert_eq!(t.to_label(99), None);
    }

    #[test]
    fn default_vocabulary_has_seven_classes() {
        assert_eq!(LabelTransformer::default().num_classes(), 7);
    }

    #[test]
    fn indices_follow_declaration_order() {
        let t = LabelTransformer::new(["a", "b", "c"]);
        assert_eq!(t.to_int("a"), Some(0));
        assert_eq!(t.to_int("c"), Some(2));
    }
}
