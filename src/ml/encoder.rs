// ============================================================
// Layer 5 — Text Encoder / Batch Assembly
// ============================================================
// Turns span text into model input form:
//   1. tokenise each text with the word-level tokenizer
//   2. pad every sequence to the longest in the batch
//      (capped at max_seq_len, floor of 1)
//   3. flatten id and mask grids and reshape into [B, S] tensors
//
// The flatten-then-reshape tensor assembly is the standard Burn
// batching pattern: one long Vec, then [batch, seq] reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::domain::errors::PipelineError;

/// Token id reserved for padding positions.
pub const PAD_ID: u32 = 0;
/// Token id for out-of-vocabulary words.
pub const UNK_ID: u32 = 1;

/// Wraps the tokenizer with the sequence-length policy.
pub struct TextEncoder {
    tokenizer:   Tokenizer,
    max_seq_len: usize,
}

/// One encoded batch in flat form, ready for tensor reshaping.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    /// Flattened token ids, row-major: [b0_t0, b0_t1, ..., bN_tS]
    pub ids: Vec<i32>,
    /// Flattened pad mask: 1.0 = real token, 0.0 = padding
    pub mask: Vec<f32>,
    pub batch_size: usize,
    pub seq_len: usize,
}

impl TextEncoder {
    pub fn new(tokenizer: Tokenizer, max_seq_len: usize) -> Self {
        Self { tokenizer, max_seq_len }
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Tokenise and pad a batch of texts.
    ///
    /// Row order matches the input order. An empty text encodes
    /// to a single padding position so no row is zero-width.
    pub fn encode_batch(&self, texts: &[String]) -> Result<EncodedBatch, PipelineError> {
        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let encoding = self.tokenizer.encode(text.as_str(), false).map_err(|e| {
                PipelineError::InvalidFeature {
                    index,
                    field:  "text",
                    reason: format!("tokenisation failed: {e}"),
                }
            })?;
            let mut ids = encoding.get_ids().to_vec();
            ids.truncate(self.max_seq_len);
            rows.push(ids);
        }

        // Pad to the longest row in the batch, never below 1
        let seq_len = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let batch_size = rows.len();

        let mut ids  = Vec::with_capacity(batch_size * seq_len);
        let mut mask = Vec::with_capacity(batch_size * seq_len);
        for row in &rows {
            for &id in row {
                ids.push(id as i32);
                mask.push(1.0);
            }
            for _ in row.len()..seq_len {
                ids.push(PAD_ID as i32);
                mask.push(0.0);
            }
        }

        Ok(EncodedBatch { ids, mask, batch_size, seq_len })
    }
}

impl EncodedBatch {
    /// Build the [batch, seq] id and mask tensors on the given device.
    pub fn to_tensors<B: Backend>(
        &self,
        device: &B::Device,
    ) -> (Tensor<B, 2, Int>, Tensor<B, 2>) {
        let token_ids = Tensor::<B, 1, Int>::from_ints(self.ids.as_slice(), device)
            .reshape([self.batch_size, self.seq_len]);
        let pad_mask = Tensor::<B, 1>::from_floats(self.mask.as_slice(), device)
            .reshape([self.batch_size, self.seq_len]);
        (token_ids, pad_mask)
    }
}

/// Build the [batch, num_features] numeric tensor from the
/// normalized feature matrix.
pub fn numeric_tensor<B: Backend>(
    matrix: &[Vec<f32>],
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch_size = matrix.len();
    let width = matrix.first().map_or(0, Vec::len);
    let flat: Vec<f32> = matrix.iter().flat_map(|row| row.iter().copied()).collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([batch_size, width])
}
