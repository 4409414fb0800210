//! Seeded row partitioning for hold-out evaluation and cross-validation
//!
//! Both splitters shuffle row indices with a [`Pcg64`] seeded from a fixed
//! value, so fold membership depends only on the row count and the seed.
//!
//! ```
//! use boxoffice_training::split::{KFold, train_test_split};
//!
//! let split = train_test_split(10, 0.2, 42);
//! assert_eq!((split.train.len(), split.test.len()), (8, 2));
//!
//! let folds = KFold::new(3, 42).split(10);
//! let sizes = folds.iter().map(|f| f.test.len()).collect::<Vec<_>>();
//! assert_eq!(sizes, [4, 3, 3]);
//! ```

use rand::{SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg64;

/// Row indices of one train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices = (0..n).collect::<Vec<_>>();
    let mut rng = Pcg64::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Holds out `ceil(test_fraction * n)` shuffled rows for testing
///
/// At least one row is kept for training whenever `n > 1`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut n_test = (fraction * n as f64).ceil() as usize;
    if n > 1 {
        n_test = n_test.min(n - 1);
    }
    let mut indices = shuffled_indices(n, seed);
    let train = indices.split_off(n_test);
    Split {
        train,
        test: indices,
    }
}

/// Shuffled K-fold cross-validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    seed: u64,
}

impl KFold {
    /// # Panics
    ///
    /// Panics if `n_splits < 2`.
    #[must_use]
    pub fn new(n_splits: usize, seed: u64) -> Self {
        assert!(n_splits >= 2, "K-fold needs at least two folds");
        Self { n_splits, seed }
    }

    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Partitions `n` rows into folds; the first `n % k` folds hold one extra row
    ///
    /// Every row appears in exactly one test fold. Returns fewer folds than
    /// requested only when `n < n_splits`, one per row.
    #[must_use]
    pub fn split(&self, n: usize) -> Vec<Split> {
        let k = self.n_splits.min(n);
        if k == 0 {
            return vec![];
        }
        let indices = shuffled_indices(n, self.seed);
        let (base, extra) = (n / k, n % k);
        let mut start = 0;
        (0..k)
            .map(|fold| {
                let size = base + usize::from(fold < extra);
                let end = start + size;
                let test = indices[start..end].to_vec();
                let train = indices[..start]
                    .iter()
                    .chain(&indices[end..])
                    .copied()
                    .collect();
                start = end;
                Split { train, test }
            })
            .collect()
    }
}
