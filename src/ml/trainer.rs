// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Runs the epoch loop over ONE encoded batch:
//   forward → cross-entropy loss → backward → Adam step
//
// Epochs are sequential with no early stopping. The model moves
// through the optimiser step by value each epoch (Burn's
// functional update style); the optimiser keeps its moment
// estimates across calls, so repeated train calls continue
// training rather than restarting.
//
// Gradients are recomputed from scratch by each backward() call —
// there is no accumulated-gradient state to clear between epochs.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::domain::errors::PipelineError;
use crate::ml::model::SpanClassifierModel;

/// Default learning rate of the pipeline's Adam optimiser.
pub const DEFAULT_LR: f64 = 1e-4;

/// Per-call training parameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub lr:     f64,
    /// Which sampling round this batch belongs to — only used
    /// for error context and logging
    pub round:  usize,
}

/// Reject a batch whose labels do not line up with its rows
/// before any tensor work happens.
pub fn check_shapes(
    text_count:  usize,
    row_count:   usize,
    label_count: usize,
) -> Result<(), PipelineError> {
    if row_count != text_count {
        return Err(PipelineError::ShapeMismatch {
            operation: "training batch",
            expected:  text_count,
            actual:    row_count,
        });
    }
    if label_count != text_count {
        return Err(PipelineError::ShapeMismatch {
            operation: "training labels",
            expected:  text_count,
            actual:    label_count,
        });
    }
    Ok(())
}

/// Train the model on one encoded batch for `opts.epochs` epochs.
///
/// Returns the updated model and the final epoch's loss. Fails
/// with Training if the loss goes non-finite; the model state
/// from the last completed step is lost in that case, but the
/// caller's previously completed batches remain applied.
pub fn train_batch<B, O>(
    mut model: SpanClassifierModel<B>,
    optim:     &mut O,
    token_ids: Tensor<B, 2, Int>,
    pad_mask:  Tensor<B, 2>,
    numeric:   Tensor<B, 2>,
    labels:    Tensor<B, 1, Int>,
    opts:      &TrainOptions,
) -> Result<(SpanClassifierModel<B>, f64), PipelineError>
where
    B: AutodiffBackend,
    O: Optimizer<SpanClassifierModel<B>, B>,
{
    let mut last_loss = f64::NAN;

    for epoch in 1..=opts.epochs {
        let (loss, _logits) = model.forward_loss(
            token_ids.clone(),
            pad_mask.clone(),
            numeric.clone(),
            labels.clone(),
        );

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            return Err(PipelineError::Training {
                round:  opts.round,
                epoch,
                reason: format!("non-finite loss {loss_val}"),
            });
        }
        last_loss = loss_val;

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(opts.lr, model, grads);

        tracing::debug!(
            "round {} epoch {:>2}/{} | loss={:.4}",
            opts.round,
            epoch,
            opts.epochs,
            loss_val,
        );
    }

    Ok((model, last_loss))
}
