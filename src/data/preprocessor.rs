// ============================================================
// Layer 4 — Feature Preprocessor
// ============================================================
// Turns a batch of FeaturedText spans into the two model inputs:
//   1. the text list, verbatim, for the text branch
//   2. the 7-column numeric matrix, min-max scaled to [0,1]
//      per column, for the numeric branch
//
// Scaler lifecycle: the scaler is fitted ONCE, on the bootstrap
// training pass, and its per-column min/max travel with the
// model artifact from then on. Every later call — training or
// inference — transforms with the stored parameters, so the same
// absolute feature value always normalizes the same way across
// calls. `fit` stays a separate, explicit operation.
//
// Degenerate columns: a column whose batch min equals its max
// (zero range) maps every row to exactly 0.0. No division by
// zero, no NaN.

use serde::{Deserialize, Serialize};

use crate::domain::errors::PipelineError;
use crate::domain::featured_text::{FeaturedText, NUM_NUMERIC_FEATURES};

// ─── MinMaxScaler ─────────────────────────────────────────────────────────────
/// Column-wise min-max scaler over the 7 numeric span features.
///
/// `transform` maps a fitted column's minimum to 0 and maximum
/// to 1. Values outside the fitted range (possible at inference
/// time, since the scaler is fitted once and reused) scale
/// linearly past [0,1] rather than being clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f32>,
    maxs: Vec<f32>,
}

impl MinMaxScaler {
    /// Fit per-column minima and maxima over a non-empty matrix.
    pub fn fit(matrix: &[[f32; NUM_NUMERIC_FEATURES]]) -> Result<Self, PipelineError> {
        if matrix.is_empty() {
            return Err(PipelineError::ShapeMismatch {
                operation: "scaler fit",
                expected:  1,
                actual:    0,
            });
        }

        let mut mins = matrix[0].to_vec();
        let mut maxs = matrix[0].to_vec();
        for row in &matrix[1..] {
            for (col, &value) in row.iter().enumerate() {
                if value < mins[col] {
                    mins[col] = value;
                }
                if value > maxs[col] {
                    maxs[col] = value;
                }
            }
        }

        Ok(Self { mins, maxs })
    }

    /// Scale one feature row with the fitted parameters.
    /// Zero-range columns map to 0.0 for every input.
    pub fn transform_row(&self, row: &[f32; NUM_NUMERIC_FEATURES]) -> [f32; NUM_NUMERIC_FEATURES] {
        let mut out = [0.0f32; NUM_NUMERIC_FEATURES];
        for (col, &value) in row.iter().enumerate() {
            let range = self.maxs[col] - self.mins[col];
            out[col] = if range == 0.0 {
                0.0
            } else {
                (value - self.mins[col]) / range
            };
        }
        out
    }

    /// Scale a whole matrix, preserving row order.
    pub fn transform(&self, matrix: &[[f32; NUM_NUMERIC_FEATURES]]) -> Vec<Vec<f32>> {
        matrix
            .iter()
            .map(|row| self.transform_row(row).to_vec())
            .collect()
    }

    pub fn num_features(&self) -> usize {
        self.mins.len()
    }
}

// ─── FeaturePreprocessor ──────────────────────────────────────────────────────
/// Stateless batch preprocessing. All scaler state lives in the
/// MinMaxScaler handed in (or returned) by the caller — there is
/// no shared mutable state across calls.
pub struct FeaturePreprocessor;

impl FeaturePreprocessor {
    /// Build the raw (unscaled) numeric matrix for a batch,
    /// validating every span's features on the way.
    ///
    /// Fails with InvalidFeature naming the span index and field
    /// if `size` or any bbox component is not finite.
    pub fn raw_matrix(
        spans: &[FeaturedText],
    ) -> Result<Vec<[f32; NUM_NUMERIC_FEATURES]>, PipelineError> {
        let mut matrix = Vec::with_capacity(spans.len());
        for (index, span) in spans.iter().enumerate() {
            if !span.size.is_finite() {
                return Err(PipelineError::InvalidFeature {
                    index,
                    field:  "size",
                    reason: format!("value {} is not finite", span.size),
                });
            }
            if let Some(bad) = span.bbox.iter().find(|v| !v.is_finite()) {
                return Err(PipelineError::InvalidFeature {
                    index,
                    field:  "bbox",
                    reason: format!("component {bad} is not finite"),
                });
            }
            matrix.push(span.numeric_features());
        }
        Ok(matrix)
    }

    /// Fit a fresh scaler on this batch and transform with it.
    /// Used exactly once per model lifetime, on the bootstrap
    /// training pass; the returned scaler is then persisted.
    pub fn preprocess_fit(
        spans: &[FeaturedText],
    ) -> Result<(Vec<String>, Vec<Vec<f32>>, MinMaxScaler), PipelineError> {
        let matrix = Self::raw_matrix(spans)?;
        let scaler = MinMaxScaler::fit(&matrix)?;
        let scaled = scaler.transform(&matrix);
        let texts  = spans.iter().map(|s| s.text.clone()).collect();
        Ok((texts, scaled, scaler))
    }

    /// Transform a batch with an already-fitted scaler.
    pub fn preprocess(
        spans:  &[FeaturedText],
        scaler: &MinMaxScaler,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), PipelineError> {
        let matrix = Self::raw_matrix(spans)?;
        let scaled = scaler.transform(&matrix);
        let texts  = spans.iter().map(|s| s.text.clone()).collect();
        Ok((texts, scaled))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, size: f32, flags: i64, bbox: [f32; 4], page: i64) -> FeaturedText {
        FeaturedText::new(text, size, flags, bbox, page)
    }

    #[test]
    fn normalization_maps_min_to_zero_and_max_to_one() {
        let spans = vec![
            span("a", 8.0, 0, [0.0, 0.0, 10.0, 10.0], 1),
            span("b", 12.0, 4, [5.0, 2.0, 20.0, 30.0], 2),
            span("c", 16.0, 16, [10.0, 4.0, 30.0, 50.0], 3),
        ];
        let (_, scaled, _) = FeaturePreprocessor::preprocess_fit(&spans).unwrap();

        for col in 0..NUM_NUMERIC_FEATURES {
            let column: Vec<f32> = scaled.iter().map(|row| row[col]).collect();
            let min = column.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = column.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            assert_eq!(min, 0.0, "column {col} min");
            assert_eq!(max, 1.0, "column {col} max");
            assert!(column.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn degenerate_column_normalizes_to_zero_without_nan() {
        // All spans share size and page — zero-range columns
        let spans = vec![
            span("a", 12.0, 0, [0.0, 0.0, 5.0, 5.0], 1),
            span("b", 12.0, 4, [1.0, 1.0, 6.0, 6.0], 1),
        ];
        let (_, scaled, _) = FeaturePreprocessor::preprocess_fit(&spans).unwrap();

        for row in &scaled {
            assert_eq!(row[0], 0.0); // size column
            assert_eq!(row[2], 0.0); // page column
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn three_record_example_from_the_layout_contract() {
        // size=[10,12,14] → [0, 0.5, 1]; page=[1,1,2] → [0, 0, 1]
        let spans = vec![
            span("x", 10.0, 0, [0.0, 0.0, 1.0, 1.0], 1),
            span("y", 12.0, 0, [0.0, 0.0, 1.0, 1.0], 1),
            span("z", 14.0, 0, [0.0, 0.0, 1.0, 1.0], 2),
        ];
        let (texts, scaled, _) = FeaturePreprocessor::preprocess_fit(&spans).unwrap();

        assert_eq!(texts, vec!["x", "y", "z"]);
        assert_eq!(scaled[0][0], 0.0);
        assert_eq!(scaled[1][0], 0.5);
        assert_eq!(scaled[2][0], 1.0);
        assert_eq!(scaled[0][2], 0.0);
        assert_eq!(scaled[1][2], 0.0);
        assert_eq!(scaled[2][2], 1.0);
    }

    #[test]
    fn non_finite_size_reports_span_index_and_field() {
        let spans = vec![
            span("ok", 10.0, 0, [0.0, 0.0, 1.0, 1.0], 1),
            span("bad", f32::NAN, 0, [0.0, 0.0, 1.0, 1.0], 1),
        ];
        let err = FeaturePreprocessor::preprocess_fit(&spans).unwrap_err();
        match err {
            PipelineError::InvalidFeature { index, field, .. } => {
                assert_eq!(index, 1);
                assert_eq!(field, "size");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_batch_cannot_fit_a_scaler() {
        let err = FeaturePreprocessor::preprocess_fit(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }

    #[test]
    fn stored_scaler_reproduces_training_time_normalization() {
        let fit_spans = vec![
            span("a", 10.0, 0, [0.0, 0.0, 1.0, 1.0], 1),
            span("b", 20.0, 8, [0.0, 0.0, 1.0, 1.0], 5),
        ];
        let (_, _, scaler) = FeaturePreprocessor::preprocess_fit(&fit_spans).unwrap();

        // A later batch reuses the stored parameters: 15 is the
        // midpoint of the fitted [10, 20] size range.
        let later = vec![span("c", 15.0, 0, [0.0, 0.0, 1.0, 1.0], 1)];
        let (_, scaled) = FeaturePreprocessor::preprocess(&later, &scaler).unwrap();
        assert_eq!(scaled[0][0], 0.5);
    }

    #[test]
    fn scaler_round_trips_through_serde() {
        let matrix = [[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0]];
        let scaler = MinMaxScaler::fit(&matrix).unwrap();
        let json = serde_json::to_string(&scaler).unwrap();
        let restored: MinMaxScaler = serde_json::from_str(&json).unwrap();
        assert_eq!(scaler, restored);
    }
}
