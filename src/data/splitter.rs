// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Two-stage seeded split:
//
//   1. shuffle, then cut off a holdout of `test_size`
//        train   = n - holdout
//   2. shuffle the holdout, then cut it in two
//        test       = holdout * val_ratio_of_test
//        validation = the rest
//
// Rounding (small inputs need a fixed rule):
//   holdout    = ceil(n * test_size)
//   validation = floor(holdout * (1 - val_ratio_of_test))
//   test       = holdout - validation
// A tiny epsilon absorbs float error so 1000 * 0.15 is 150,
// not 151. With holdout = 1 and a ratio below 1 the single
// record goes to test unless validation's share reaches 1.
//
// Each stage reseeds a StdRng from the same seed, so the
// partition depends only on (input order, ratios, seed).
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::error::PrepError;

/// Absorbs float error in ratio * count products.
const EPSILON: f64 = 1e-9;

/// The three disjoint partitions of one input sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult<T> {
    pub train:      Vec<T>,
    pub validation: Vec<T>,
    pub test:       Vec<T>,
}

impl<T> Default for SplitResult<T> {
    fn default() -> Self {
        Self { train: Vec::new(), validation: Vec::new(), test: Vec::new() }
    }
}

impl<T> SplitResult<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<T>, Vec<T>) {
        (self.train, self.validation, self.test)
    }
}

pub struct DataSplitter {
    seed: u64,
}

impl DataSplitter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Check both ratios before any work is done.
    pub fn validate(test_size: f64, val_ratio_of_test: f64) -> Result<(), PrepError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PrepError::InvalidTestSize(test_size));
        }
        if !(0.0..=1.0).contains(&val_ratio_of_test) {
            return Err(PrepError::InvalidValRatio(val_ratio_of_test));
        }
        Ok(())
    }

    pub fn split<T>(
        &self,
        records:           Vec<T>,
        test_size:         f64,
        val_ratio_of_test: f64,
    ) -> Result<SplitResult<T>, PrepError> {
        Self::validate(test_size, val_ratio_of_test)?;

        let total       = records.len();
        let holdout_len = holdout_size(total, test_size);

        // ── Stage 1: train vs holdout ─────────────────────────────────────────
        let (train, holdout) = self.shuffle_and_cut(records, total - holdout_len);

        if holdout.is_empty() {
            tracing::debug!("Dataset split: {} train, empty holdout", train.len());
            return Ok(SplitResult { train, validation: Vec::new(), test: Vec::new() });
        }

        // ── Stage 2: validation vs test ───────────────────────────────────────
        let val_len = validation_size(holdout.len(), val_ratio_of_test);
        let (validation, test) = self.shuffle_and_cut(holdout, val_len);

        tracing::debug!(
            "Dataset split: {} train, {} validation, {} test",
            train.len(),
            validation.len(),
            test.len(),
        );

        Ok(SplitResult { train, validation, test })
    }

    /// Shuffle with a fresh seeded RNG; the first `keep` items form the
    /// left part.
    fn shuffle_and_cut<T>(&self, mut items: Vec<T>, keep: usize) -> (Vec<T>, Vec<T>) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        items.shuffle(&mut rng);

        let keep = keep.min(items.len());
        let rest = items.split_off(keep);
        (items, rest)
    }
}

fn holdout_size(total: usize, test_size: f64) -> usize {
    let raw = (total as f64 * test_size - EPSILON).ceil();
    (raw.max(0.0) as usize).min(total)
}

fn validation_size(holdout: usize, val_ratio_of_test: f64) -> usize {
    let raw = (holdout as f64 * (1.0 - val_ratio_of_test) + EPSILON).floor();
    (raw.max(0.0) as usize).min(holdout)
}
