//! Least-squares gradient boosting
//!
//! Starts from the target mean and adds one shrunken tree per stage, each
//! fitted to the current residuals on a row subsample drawn without
//! replacement. A single [`Pcg64`] seeded once drives both the row subsample
//! and the per-node feature sampling, so a fit is reproducible from its seed.

use rand::{SeedableRng as _, seq::index};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::tree::{MaxFeatures, RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub learning_rate: f64,
    /// Fraction of rows each stage is fitted on
    pub subsample: f64,
    pub tree: TreeParams,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 150,
            learning_rate: 0.15,
            subsample: 0.9,
            tree: TreeParams {
                max_depth: Some(4),
                min_samples_split: 10,
                min_samples_leaf: 4,
                max_features: MaxFeatures::Sqrt,
            },
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    init: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl GradientBoostingRegressor {
    /// # Panics
    ///
    /// Panics if `rows` is empty or its length differs from `target`.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], target: &[f64], params: &BoostingParams) -> Self {
        assert!(!rows.is_empty(), "cannot fit boosting on zero rows");
        assert_eq!(rows.len(), target.len());
        let n = rows.len();
        let n_features = rows[0].len();
        let n_sample = ((params.subsample.clamp(0.0, 1.0) * n as f64) as usize).clamp(1, n);
        let mut rng = Pcg64::seed_from_u64(params.seed);

        let init = target.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![init; n];
        let mut stages = Vec::with_capacity(params.n_stages);
        let mut importances = vec![0.0; n_features];

        for _ in 0..params.n_stages {
            let residuals = target
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect::<Vec<_>>();
            let mut samples = if n_sample < n {
                index::sample(&mut rng, n, n_sample).into_vec()
            } else {
                (0..n).collect()
            };
            samples.sort_unstable();

            let tree = RegressionTree::fit(rows, &residuals, &samples, &params.tree, &mut rng);
            for (p, row) in predictions.iter_mut().zip(rows) {
                *p += params.learning_rate * tree.predict_row(row);
            }
            for (sum, imp) in importances.iter_mut().zip(tree.feature_importances()) {
                *sum += imp;
            }
            stages.push(tree);
        }

        let total = importances.iter().sum::<f64>();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        tracing::debug!(stages = stages.len(), n_sample, "fitted gradient boosting");
        Self {
            init,
            learning_rate: params.learning_rate,
            stages,
            importances,
        }
    }

    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self
                .stages
                .iter()
                .map(|t| self.learning_rate * t.predict_row(row))
                .sum::<f64>()
    }

    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }
}
