// ============================================================
// Layer 4 — Span Sources
// ============================================================
// Where FeaturedText spans come from. Document-to-span
// extraction (PDF parsing, OCR) is an external collaborator —
// this module only defines the interface the pipeline consumes,
// plus a JSON-file implementation used for wiring and demos.
//
// By programming against the trait, a future PdfSpanExtractor
// can drop in without touching the classifier.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::featured_text::FeaturedText;

// ─── SpanSource ───────────────────────────────────────────────────────────────
/// Any component that can turn a document file into an ordered
/// list of text spans with layout metadata.
///
/// Page bounds are inclusive and optional; an unbounded side
/// defaults to the start/end of the document.
pub trait SpanSource {
    fn extract(
        &self,
        path:      &Path,
        from_page: Option<i64>,
        to_page:   Option<i64>,
    ) -> Result<Vec<FeaturedText>>;
}

// ─── JsonSpanSource ───────────────────────────────────────────────────────────
/// Reads spans from a JSON file holding an array of FeaturedText
/// objects — the same shape the training dataset uses, minus the
/// label field.
pub struct JsonSpanSource;

impl SpanSource for JsonSpanSource {
    fn extract(
        &self,
        path:      &Path,
        from_page: Option<i64>,
        to_page:   Option<i64>,
    ) -> Result<Vec<FeaturedText>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Cannot read span file '{}'", path.display()))?;

        let spans: Vec<FeaturedText> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed span file '{}'", path.display()))?;

        let total = spans.len();
        let filtered: Vec<FeaturedText> = spans
            .into_iter()
            .filter(|span| {
                from_page.map_or(true, |from| span.page >= from)
                    && to_page.map_or(true, |to| span.page <= to)
            })
            .collect();

        tracing::debug!(
            "Extracted {} of {} spans from '{}' (pages {:?}..{:?})",
            filtered.len(),
            total,
            path.display(),
            from_page,
            to_page,
        );
        Ok(filtered)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SPANS: &str = r#"[
        {"text": "Header", "size": 9.0, "flags": 0, "bbox": [0,0,100,10], "page": 1},
        {"text": "Body",   "size": 11.0, "flags": 0, "bbox": [0,20,100,40], "page": 2},
        {"text": "Note",   "size": 8.0, "flags": 2, "bbox": [0,50,100,60], "page": 3}
    ]"#;

    fn span_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SPANS.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_to_the_full_document() {
        let file = span_file();
        let spans = JsonSpanSource.extract(file.path(), None, None).unwrap();
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn page_bounds_are_inclusive() {
        let file = span_file();
        let spans = JsonSpanSource.extract(file.path(), Some(2), Some(3)).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Body");
        assert_eq!(spans[1].text, "Note");
    }

    #[test]
    fn one_sided_bound_works() {
        let file = span_file();
        let spans = JsonSpanSource.extract(file.path(), None, Some(1)).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Header");
    }
}
