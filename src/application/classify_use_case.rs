// ============================================================
// Layer 2 — Classify Use Case
// ============================================================
// The inference workflow:
//   1. Build (or load) the pipeline
//   2. Extract spans from a document export via a SpanSource
//   3. Classify the spans
//   4. Pair each span with its label name for the caller
//
// The use case never prints — Layer 1 decides presentation.

use std::path::Path;

use anyhow::{Context, Result};

use crate::data::source::{JsonSpanSource, SpanSource};
use crate::domain::featured_text::FeaturedText;
use crate::ml::pipeline::{ClassifierPipeline, PipelineConfig};

/// One classified span: the input and its predicted label.
#[derive(Debug, Clone)]
pub struct ClassifiedSpan {
    pub span:  FeaturedText,
    pub label: String,
}

pub struct ClassifyUseCase {
    pipeline: ClassifierPipeline,
}

impl ClassifyUseCase {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let pipeline = ClassifierPipeline::new(config)
            .context("Cannot initialise the classifier pipeline")?;
        Ok(Self { pipeline })
    }

    /// Classify every span of a JSON document export, optionally
    /// restricted to an inclusive page range.
    pub fn classify_document(
        &self,
        path:      &Path,
        from_page: Option<i64>,
        to_page:   Option<i64>,
    ) -> Result<Vec<ClassifiedSpan>> {
        let source = JsonSpanSource;
        let spans = source
            .extract(path, from_page, to_page)
            .with_context(|| format!("Cannot extract spans from '{}'", path.display()))?;

        if spans.is_empty() {
            tracing::warn!("No spans in the selected page range of '{}'", path.display());
            return Ok(Vec::new());
        }

        self.classify_spans(spans)
    }

    /// Classify already-extracted spans.
    pub fn classify_spans(&self, spans: Vec<FeaturedText>) -> Result<Vec<ClassifiedSpan>> {
        let predictions = self.pipeline.classify(&spans)?;

        let labels = self.pipeline.labels();
        let classified = spans
            .into_iter()
            .zip(predictions)
            .map(|(span, class)| ClassifiedSpan {
                span,
                // predict() guarantees class < num_classes
                label: labels.to_label(class).unwrap_or("unknown").to_string(),
            })
            .collect();

        Ok(classified)
    }
}
