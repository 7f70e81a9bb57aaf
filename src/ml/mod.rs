// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here; outside this
// layer only infra's artifact store touches burn (for the
// weight recorder). If Burn's API changes, these are the only
// places that move.
//
//   model.rs    — the dual-branch classifier architecture:
//                 text embedding branch + numeric layout branch,
//                 concatenated into a fused classification head
//
//   encoder.rs  — tokenisation of span text into padded id/mask
//                 batches, and tensor assembly
//
//   trainer.rs  — the epoch loop: forward, cross-entropy loss,
//                 backward, Adam step, non-finite-loss guard
//
//   pipeline.rs — the pipeline controller: lazy initialisation,
//                 predict, windowed/randomized training rounds,
//                 artifact persistence
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Dual-branch span classifier architecture
pub mod model;

/// Text tokenisation and batch tensor assembly
pub mod encoder;

/// Training loop over one encoded batch
pub mod trainer;

/// Pipeline controller — lifecycle, training rounds, prediction
pub mod pipeline;
