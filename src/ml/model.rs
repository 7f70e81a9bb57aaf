// ============================================================
// Layer 5 — Dual-Branch Classifier Model
// ============================================================
// Two input branches fused into one classification head:
//
//   text branch     token ids → Embedding → masked mean pool
//                   → [batch, embedding_dim]
//   numeric branch  scaled layout features → Linear(7 → 128)
//                   → ReLU → [batch, 128]
//   fusion          concat → Linear(→ 256) → ReLU
//                   → Linear(256 → num_classes) → raw logits
//
// The text branch is deliberately opaque to the rest of the
// model: anything that yields one fixed-size vector per example
// could replace the embedding + mean pool without touching the
// fusion head.
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
    tensor::backend::AutodiffBackend,
};

/// Width of the numeric branch's hidden layer.
pub const NUMERIC_HIDDEN: usize = 128;
/// Width of the fusion layer.
pub const FUSION_HIDDEN: usize = 256;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SpanClassifierConfig {
    pub vocab_size:           usize,
    pub max_seq_len:          usize,
    pub embedding_dim:        usize,
    pub num_numeric_features: usize,
    pub num_classes:          usize,
}

impl SpanClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpanClassifierModel<B> {
        let token_embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let numeric_layer   = LinearConfig::new(self.num_numeric_features, NUMERIC_HIDDEN).init(device);
        let fusion_layer    = LinearConfig::new(self.embedding_dim + NUMERIC_HIDDEN, FUSION_HIDDEN).init(device);
        let output_layer    = LinearConfig::new(FUSION_HIDDEN, self.num_classes).init(device);
        SpanClassifierModel {
            token_embedding,
            numeric_layer,
            fusion_layer,
            output_layer,
            embedding_dim: self.embedding_dim,
            num_classes:   self.num_classes,
        }
    }
}

#[derive(Module, Debug)]
pub struct SpanClassifierModel<B: Backend> {
    pub token_embedding: Embedding<B>,
    pub numeric_layer:   Linear<B>,
    pub fusion_layer:    Linear<B>,
    pub output_layer:    Linear<B>,
    pub embedding_dim:   usize,
    pub num_classes:     usize,
}

impl<B: Backend> SpanClassifierModel<B> {
    /// token_ids, pad_mask: [batch, seq_len]; numeric: [batch, num_numeric_features]
    /// → logits: [batch, num_classes]
    ///
    /// Output row count always equals the input batch size;
    /// column count equals num_classes fixed at construction.
    pub fn forward(
        &self,
        token_ids: Tensor<B, 2, Int>,
        pad_mask:  Tensor<B, 2>,
        numeric:   Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = token_ids.dims();

        // ── Text branch: embed then mean-pool over real tokens ───────────────
        let embedded = self.token_embedding.forward(token_ids); // [B, S, E]

        // Padding positions must not contribute to the pooled vector
        let mask3 = pad_mask
            .clone()
            .reshape([batch_size, seq_len, 1])
            .expand([batch_size, seq_len, self.embedding_dim]);
        let summed = (embedded * mask3)
            .sum_dim(1)
            .reshape([batch_size, self.embedding_dim]);

        // clamp_min(1.0) keeps an all-padding row from dividing by zero
        let counts = pad_mask
            .sum_dim(1)
            .clamp_min(1.0)
            .expand([batch_size, self.embedding_dim]);
        let text_vec = summed / counts; // [B, E]

        // ── Numeric branch ────────────────────────────────────────────────────
        let numeric_vec = relu(self.numeric_layer.forward(numeric)); // [B, 128]

        // ── Fusion + classification head ──────────────────────────────────────
        let fused = Tensor::cat(vec![text_vec, numeric_vec], 1); // [B, E + 128]
        let fused = relu(self.fusion_layer.forward(fused));      // [B, 256]

        // Raw scores — softmax happens inside the loss / after argmax
        self.output_layer.forward(fused) // [B, num_classes]
    }

    /// Forward pass plus mean cross-entropy loss against integer
    /// class labels. Training-side entry point.
    pub fn forward_loss(
        &self,
        token_ids: Tensor<B, 2, Int>,
        pad_mask:  Tensor<B, 2>,
        numeric:   Tensor<B, 2>,
        labels:    Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(token_ids, pad_mask, numeric);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}
