// ============================================================
// Layer 3 — FeaturedText Domain Type
// ============================================================
// One text span extracted from a document page, together with
// the layout metadata the extractor recorded for it:
//   - size:  font size of the span
//   - flags: style flag bits (bold, italic, ...)
//   - bbox:  bounding box on the page as (x1, y1, x2, y2)
//   - page:  1-based page number
//
// FeaturedText records are transient — created per extraction
// call, consumed by the classifier, never stored.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Number of scalar layout features per span.
/// The order is fixed: [size, flags, page, x1, y1, x2, y2].
/// The model's `num_numeric_features` must equal this constant.
pub const NUM_NUMERIC_FEATURES: usize = 7;

/// A text span plus its layout metadata.
///
/// `bbox` is a fixed 4-element array — serde rejects any JSON
/// bounding box that does not have exactly 4 components, and the
/// type system enforces the arity everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedText {
    /// The span text, verbatim as extracted
    pub text: String,

    /// Font size of the span
    pub size: f32,

    /// Style flag bits (bold, italic, superscript, ...)
    pub flags: i64,

    /// Bounding box on the page: (x1, y1, x2, y2)
    pub bbox: [f32; 4],

    /// 1-based page number the span appears on
    pub page: i64,
}

impl FeaturedText {
    pub fn new(
        text:  impl Into<String>,
        size:  f32,
        flags: i64,
        bbox:  [f32; 4],
        page:  i64,
    ) -> Self {
        Self { text: text.into(), size, flags, bbox, page }
    }

    /// The raw numeric feature vector for this span:
    /// `[size, flags, page, x1, y1, x2, y2]`.
    ///
    /// Order and count are part of the model contract — the
    /// classifier's numeric branch is built for exactly
    /// `NUM_NUMERIC_FEATURES` inputs in exactly this order.
    pub fn numeric_features(&self) -> [f32; NUM_NUMERIC_FEATURES] {
        [
            self.size,
            self.flags as f32,
            self.page as f32,
            self.bbox[0],
            self.bbox[1],
            self.bbox[2],
            self.bbox[3],
        ]
    }
}

/// A FeaturedText with its ground-truth label — the unit of the
/// training dataset file. The span fields are flattened so the
/// JSON shape is one flat object per record:
/// `{"text": ..., "size": ..., ..., "label": "main_text"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    #[serde(flatten)]
    pub span: FeaturedText,

    /// Human-readable class label; translated to an index by the
    /// LabelTransformer before training
    pub label: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_feature_order_is_size_flags_page_bbox() {
        let span = FeaturedText::new("Chapter 1", 18.0, 20, [10.0, 20.0, 300.0, 40.0], 3);
        assert_eq!(
            span.numeric_features(),
            [18.0, 20.0, 3.0, 10.0, 20.0, 300.0, 40.0]
        );
    }

    #[test]
    fn training_data_deserializes_flat_json() {
        let json = r#"{
            "text": "Intro",
            "size": 12.5,
            "flags": 0,
            "bbox": [1.0, 2.0, 3.0, 4.0],
            "page": 1,
            "label": "main_text"
        }"#;
        let record: TrainingData = serde_json::from_str(json).unwrap();
        assert_eq!(record.span.text, "Intro");
        assert_eq!(record.label, "main_text");
    }

    #[test]
    fn bbox_with_wrong_arity_is_rejected() {
        let json = r#"{
            "text": "Intro",
            "size": 12.5,
            "flags": 0,
            "bbox": [1.0, 2.0, 3.0],
            "page": 1,
            "label": "main_text"
        }"#;
        assert!(serde_json::from_str::<TrainingData>(json).is_err());
    }
}
