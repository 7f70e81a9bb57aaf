// ============================================================
// Layer 4 — Training Batch Sampler
// ============================================================
// Plans which dataset records go into each training-step call.
// One round is one application of the configured strategy:
//
//   Windowed   — slide a fixed-size window across the dataset
//                in order. ceil(D/W) batches per round, the last
//                one truncated to the remaining records; every
//                record appears in exactly one window per round.
//
//   Randomized — draw ONE sample of window_size records without
//                replacement. One batch per round; a later round
//                may repeat records from an earlier one, a single
//                round never contains duplicates.
//
// Both modes are branches of the same planner so the training
// driver has exactly one loop body.
//
// Reference: rand crate documentation (index::sample)

use rand::Rng;

use crate::domain::errors::PipelineError;

/// How one training round picks its batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Fixed-size window slid across the full dataset in order
    Windowed { window_size: usize },
    /// One random sample of `window_size` records per round,
    /// drawn without replacement
    Randomized { window_size: usize },
}

impl SamplingStrategy {
    pub fn window_size(&self) -> usize {
        match *self {
            SamplingStrategy::Windowed { window_size } => window_size,
            SamplingStrategy::Randomized { window_size } => window_size,
        }
    }
}

/// Plan the batches (as dataset indices) for one round.
///
/// A window size larger than the dataset is clamped to the
/// dataset length — the truncated-final-window rule applied to a
/// window that was already too big.
pub fn plan_round<R: Rng>(
    strategy:    SamplingStrategy,
    dataset_len: usize,
    rng:         &mut R,
) -> Result<Vec<Vec<usize>>, PipelineError> {
    if dataset_len == 0 {
        return Err(PipelineError::ShapeMismatch {
            operation: "sampling round",
            expected:  1,
            actual:    0,
        });
    }
    if strategy.window_size() == 0 {
        return Err(PipelineError::ShapeMismatch {
            operation: "sampling window",
            expected:  1,
            actual:    0,
        });
    }

    let window = strategy.window_size().min(dataset_len);
    if window < strategy.window_size() {
        tracing::warn!(
            "Window size {} exceeds dataset size {} — clamping",
            strategy.window_size(),
            dataset_len
        );
    }

    let batches = match strategy {
        SamplingStrategy::Windowed { .. } => (0..dataset_len)
            .collect::<Vec<usize>>()
            .chunks(window)
            .map(<[usize]>::to_vec)
            .collect(),
        SamplingStrategy::Randomized { .. } => {
            vec![rand::seq::index::sample(rng, dataset_len, window).into_vec()]
        }
    };

    Ok(batches)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn windowed_round_covers_every_record_exactly_once() {
        let mut rng = rand::thread_rng();
        let batches = plan_round(SamplingStrategy::Windowed { window_size: 3 }, 10, &mut rng).unwrap();

        // ceil(10/3) = 4 batches, last truncated to 10 mod 3 = 1
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0], vec![0, 1, 2]);
        assert_eq!(batches[3], vec![9]);

        let seen: Vec<usize> = batches.into_iter().flatten().collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn evenly_divisible_dataset_has_full_final_window() {
        let mut rng = rand::thread_rng();
        let batches = plan_round(SamplingStrategy::Windowed { window_size: 3 }, 9, &mut rng).unwrap();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 3));
    }

    #[test]
    fn randomized_round_draws_one_batch_without_replacement() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let batches =
                plan_round(SamplingStrategy::Randomized { window_size: 5 }, 12, &mut rng).unwrap();
            assert_eq!(batches.len(), 1);
            assert_eq!(batches[0].len(), 5);

            let unique: HashSet<usize> = batches[0].iter().copied().collect();
            assert_eq!(unique.len(), 5, "a single round must not repeat records");
            assert!(batches[0].iter().all(|&i| i < 12));
        }
    }

    #[test]
    fn oversized_window_is_clamped_to_dataset_length() {
        let mut rng = rand::thread_rng();
        let batches =
            plan_round(SamplingStrategy::Randomized { window_size: 50 }, 4, &mut rng).unwrap();
        assert_eq!(batches[0].len(), 4);
    }

    #[test]
    fn empty_dataset_and_zero_window_are_rejected() {
        let mut rng = rand::thread_rng();
        assert!(plan_round(SamplingStrategy::Windowed { window_size: 4 }, 0, &mut rng).is_err());
        assert!(plan_round(SamplingStrategy::Windowed { window_size: 0 }, 4, &mut rng).is_err());
    }
}
