//! CART regression tree
//!
//! Trees are grown depth-first with squared-error impurity. At every node a
//! random subset of features is examined (see [`MaxFeatures`]) and the split
//! with the largest reduction in the sum of squared errors wins; ties keep the
//! first candidate found.
//!
//! # Missing Values
//!
//! `NaN` feature values order below every observed value. A split between the
//! missing group and the smallest observed value is stored without a
//! threshold: missing goes left, everything else right.
//!
//! # Feature Importances
//!
//! Each split credits its feature with the SSE reduction it achieves. The
//! totals are normalized to sum to 1 (all zeros for a single-leaf tree).

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

/// Number of features examined at each node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    /// Fraction of the features, at least one
    Fraction(f64),
    /// Fixed count, capped at the number of features
    Count(usize),
}

impl MaxFeatures {
    /// Resolves the strategy against `n_features` (never less than one)
    ///
    /// ```
    /// use boxoffice_training::tree::MaxFeatures;
    ///
    /// assert_eq!(MaxFeatures::Sqrt.resolve(30), 5);
    /// assert_eq!(MaxFeatures::Log2.resolve(30), 4);
    /// assert_eq!(MaxFeatures::Fraction(0.5).resolve(30), 15);
    /// assert_eq!(MaxFeatures::Count(100).resolve(30), 30);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            Self::All => n_features,
            Self::Sqrt => n.sqrt() as usize,
            Self::Log2 => n.log2() as usize,
            Self::Fraction(f) => (f * n) as usize,
            Self::Count(c) => c,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Growth limits of a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        /// Rows with `value <= threshold` go left; `None` splits missing from present
        threshold: Option<f64>,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

struct Candidate {
    feature: usize,
    threshold: Option<f64>,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct Grower<'a, R: ?Sized> {
    rows: &'a [Vec<f64>],
    target: &'a [f64],
    params: &'a TreeParams,
    n_candidates: usize,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

fn sort_key(value: f64) -> f64 {
    if value.is_nan() {
        f64::NEG_INFINITY
    } else {
        value
    }
}

fn goes_left(value: f64, threshold: Option<f64>) -> bool {
    let key = sort_key(value);
    match threshold {
        Some(t) => key <= t,
        None => key == f64::NEG_INFINITY,
    }
}

fn split_threshold(lower: f64, upper: f64) -> Option<f64> {
    if lower == f64::NEG_INFINITY {
        return None;
    }
    if upper.is_finite() {
        let mid = f64::midpoint(lower, upper);
        // rounding can land the midpoint on the upper value
        if mid < upper {
            return Some(mid);
        }
    }
    Some(lower)
}

impl<R> Grower<'_, R>
where
    R: Rng + ?Sized,
{
    #[expect(clippy::cast_precision_loss)]
    fn mean(&self, samples: &[usize]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|&i| self.target[i]).sum::<f64>() / samples.len() as f64
    }

    fn sse(&self, samples: &[usize]) -> f64 {
        let mean = self.mean(samples);
        samples
            .iter()
            .map(|&i| (self.target[i] - mean).powi(2))
            .sum()
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.mean(&samples),
        });

        let params = self.params;
        let n = samples.len();
        let depth_exhausted = params.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted
            || n < params.min_samples_split.max(2)
            || n < 2 * params.min_samples_leaf.max(1)
        {
            return id;
        }
        let node_sse = self.sse(&samples);
        if node_sse <= f64::EPSILON {
            return id;
        }

        let Some(best) = self.best_split(&samples, node_sse) else {
            return id;
        };
        self.importances[best.feature] += best.gain;
        let left = self.grow(best.left, depth + 1);
        let right = self.grow(best.right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn sorted_by(&self, samples: &[usize], feature: usize) -> Vec<usize> {
        let mut order = samples.to_vec();
        order.sort_by(|&a, &b| {
            sort_key(self.rows[a][feature]).total_cmp(&sort_key(self.rows[b][feature]))
        });
        order
    }

    /// Finds the best split over randomly ordered features
    ///
    /// Features that are constant within the node do not count towards
    /// `n_candidates`, so drawing continues until enough varying features
    /// have been examined or none are left.
    #[expect(clippy::cast_precision_loss)]
    fn best_split(&mut self, samples: &[usize], node_sse: f64) -> Option<Candidate> {
        let n_features = self.importances.len();
        let features = index::sample(&mut *self.rng, n_features, n_features);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let n = samples.len();
        let total_sum = samples.iter().map(|&i| self.target[i]).sum::<f64>();
        let total_sq = samples.iter().map(|&i| self.target[i].powi(2)).sum::<f64>();

        let mut best: Option<(usize, usize, f64)> = None;
        let mut examined = 0;
        for feature in features {
            if examined >= self.n_candidates {
                break;
            }
            let order = self.sorted_by(samples, feature);
            let first = sort_key(self.rows[order[0]][feature]);
            let last = sort_key(self.rows[order[n - 1]][feature]);
            if first >= last {
                continue;
            }
            examined += 1;

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let y = self.target[order[pos]];
                left_sum += y;
                left_sq += y * y;
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = sort_key(self.rows[order[pos]][feature]);
                let next = sort_key(self.rows[order[pos + 1]][feature]);
                if here >= next {
                    continue;
                }
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / n_left as f64;
                let right_sse = right_sq - right_sum * right_sum / n_right as f64;
                let gain = node_sse - left_sse - right_sse;
                if gain > 1e-12 && best.is_none_or(|(_, _, g)| gain > g) {
                    best = Some((feature, pos, gain));
                }
            }
        }

        let (feature, pos, gain) = best?;
        // stable sort of the same samples reproduces the scanned order
        let mut left = self.sorted_by(samples, feature);
        let lower = sort_key(self.rows[left[pos]][feature]);
        let upper = sort_key(self.rows[left[pos + 1]][feature]);
        let right = left.split_off(pos + 1);
        Some(Candidate {
            feature,
            threshold: split_threshold(lower, upper),
            gain,
            left,
            right,
        })
    }
}

impl RegressionTree {
    /// Grows a tree on the rows listed in `samples`
    ///
    /// `samples` may repeat indices (bootstrap draws). `target` is indexed the
    /// same way as `rows`.
    ///
    /// # Panics
    ///
    /// Panics if `rows` and `target` differ in length.
    pub fn fit<R>(
        rows: &[Vec<f64>],
        target: &[f64],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        assert_eq!(rows.len(), target.len());
        let n_features = rows.first().map_or(0, Vec::len);
        let mut grower = Grower {
            rows,
            target,
            params,
            n_candidates: params.max_features.resolve(n_features).min(n_features),
            rng,
            nodes: vec![],
            importances: vec![0.0; n_features],
        };
        grower.grow(samples.to_vec(), 0);

        let mut importances = grower.importances;
        let total = importances.iter().sum::<f64>();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        Self {
            nodes: grower.nodes,
            importances,
        }
    }

    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if goes_left(row[*feature], *threshold) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Normalized impurity-decrease importance per feature
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        depth_of(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn fit(rows: &[Vec<f64>], target: &[f64], params: &TreeParams) -> RegressionTree {
        let samples = (0..rows.len()).collect::<Vec<_>>();
        RegressionTree::fit(rows, target, &samples, params, &mut Pcg64::seed_from_u64(0))
    }

    #[test]
    fn test_step_function() {
        let rows = (0..10).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
        let target = (0..10)
            .map(|i| if i < 5 { 1.0 } else { 9.0 })
            .collect::<Vec<_>>();
        let tree = fit(&rows, &target, &TreeParams::default());
        assert_eq!(tree.n_leaves(), 2);
        assert!((tree.predict_row(&[4.4]) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(&[4.6]) - 9.0).abs() < 1e-12);
        assert_eq!(tree.feature_importances(), [1.0]);
    }

    #[test]
    fn test_limits() {
        let rows = (0..32).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
        let target = rows.iter().map(|r| r[0] * r[0]).collect::<Vec<_>>();

        let shallow = fit(
            &rows,
            &target,
            &TreeParams {
                max_depth: Some(2),
                ..TreeParams::default()
            },
        );
        assert!(shallow.depth() <= 2);

        let coarse = fit(
            &rows,
            &target,
            &TreeParams {
                min_samples_leaf: 8,
                ..TreeParams::default()
            },
        );
        assert!(coarse.n_leaves() <= 4);

        let stump = fit(
            &rows,
            &target,
            &TreeParams {
                min_samples_split: 64,
                ..TreeParams::default()
            },
        );
        assert_eq!(stump.n_leaves(), 1);
        assert_eq!(stump.feature_importances(), [0.0]);
    }

    #[test]
    fn test_missing_values_split_off() {
        let rows = vec![
            vec![f64::NAN],
            vec![f64::NAN],
            vec![1.0],
            vec![2.0],
        ];
        let target = [10.0, 10.0, 0.0, 0.0];
        let tree = fit(&rows, &target, &TreeParams::default());
        assert!((tree.predict_row(&[f64::NAN]) - 10.0).abs() < 1e-12);
        assert!(tree.predict_row(&[-1000.0]).abs() < 1e-12);

        // the fitted tree survives JSON, which has no infinities
        let json = serde_json::to_string(&tree).unwrap();
        let restored: RegressionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_importance_follows_signal() {
        let rows = (0..40)
            .map(|i| vec![f64::from(i % 7), f64::from(i)])
            .collect::<Vec<_>>();
        let target = rows.iter().map(|r| 3.0 * r[1]).collect::<Vec<_>>();
        let tree = fit(&rows, &target, &TreeParams::default());
        let imp = tree.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[1] > imp[0]);
    }

    #[test]
    fn test_constant_column_does_not_stop_growth() {
        let rows = (0..100).map(|i| vec![f64::from(i), 0.0]).collect::<Vec<_>>();
        let target = (0..100).map(f64::from).collect::<Vec<_>>();
        let samples = (0..rows.len()).collect::<Vec<_>>();
        let params = TreeParams {
            max_features: MaxFeatures::Sqrt,
            ..TreeParams::default()
        };
        for seed in 0..20 {
            let mut rng = Pcg64::seed_from_u64(seed);
            let tree = RegressionTree::fit(&rows, &target, &samples, &params, &mut rng);
            assert!(tree.n_leaves() > 1, "seed {seed} grew a single leaf");
            assert_eq!(tree.feature_importances()[1], 0.0);
        }
    }

    #[test]
    fn test_large_monotone_split() {
        let n = 20_000;
        let rows = (0..n).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
        let target = (0..n).map(|i| if i < n / 4 { 0.0 } else { 1.0 }).collect::<Vec<_>>();
        let tree = fit(
            &rows,
            &target,
            &TreeParams {
                max_depth: Some(1),
                ..TreeParams::default()
            },
        );
        assert_eq!(tree.n_leaves(), 2);
        assert!(tree.predict_row(&[f64::from(n / 4 - 1)]).abs() < 1e-12);
        assert!((tree.predict_row(&[f64::from(n / 4)]) - 1.0).abs() < 1e-12);
    }
}
