//! Regression scores comparing predicted values against observed targets.
//!
//! All functions take `(observed, predicted)` slices of equal length and
//! return `NaN` for empty input.

use std::iter;

/// The three scores reported for every model evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    /// Coefficient of determination
    pub r2: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Root-mean-squared error
    pub rmse: f64,
}

impl RegressionMetrics {
    /// Scores `predicted` against `observed`.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[must_use]
    pub fn compute(observed: &[f64], predicted: &[f64]) -> Self {
        Self {
            r2: r2_score(observed, predicted),
            mae: mean_absolute_error(observed, predicted),
            rmse: root_mean_squared_error(observed, predicted),
        }
    }

    /// Averages per-fold metrics component-wise.
    ///
    /// Returns `None` when `folds` is empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(folds: &[Self]) -> Option<Self> {
        if folds.is_empty() {
            return None;
        }
        let n = folds.len() as f64;
        Some(Self {
            r2: folds.iter().map(|m| m.r2).sum::<f64>() / n,
            mae: folds.iter().map(|m| m.mae).sum::<f64>() / n,
            rmse: folds.iter().map(|m| m.rmse).sum::<f64>() / n,
        })
    }
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant `observed` series has no variance to explain: the score is
/// `1.0` when the prediction is exact and `0.0` otherwise.
///
/// # Examples
///
/// ```
/// use boxoffice_stats::metrics::r2_score;
///
/// assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
/// assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn r2_score(observed: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return f64::NAN;
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_res = iter::zip(observed, predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>();
    let ss_tot = observed.iter().map(|y| (y - mean).powi(2)).sum::<f64>();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Mean of `|observed - predicted|`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_absolute_error(observed: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return f64::NAN;
    }
    iter::zip(observed, predicted)
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / observed.len() as f64
}

/// Square root of the mean squared error.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn root_mean_squared_error(observed: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return f64::NAN;
    }
    let mse = iter::zip(observed, predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / observed.len() as f64;
    mse.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_errors() {
        let observed = [1.0, 2.0, 3.0, 4.0];
        let predicted = [2.0, 2.0, 3.0, 2.0];
        assert!((mean_absolute_error(&observed, &predicted) - 0.75).abs() < 1e-12);
        // squared errors: 1, 0, 0, 4 => mse 1.25
        assert!((root_mean_squared_error(&observed, &predicted) - 1.25_f64.sqrt()).abs() < 1e-12);
        // ss_tot = 5.0
        assert!((r2_score(&observed, &predicted) - (1.0 - 5.0 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let observed = [1.0, 2.0, 3.0];
        let predicted = [3.0, 2.0, 1.0];
        assert!(r2_score(&observed, &predicted) < 0.0);
    }

    #[test]
    fn test_constant_target() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 4.0]), 0.0);
    }

    #[test]
    fn test_mean_of_folds() {
        let folds = [
            RegressionMetrics {
                r2: 0.5,
                mae: 2.0,
                rmse: 3.0,
            },
            RegressionMetrics {
                r2: 0.7,
                mae: 4.0,
                rmse: 5.0,
            },
        ];
        let mean = RegressionMetrics::mean(&folds).unwrap();
        assert!((mean.r2 - 0.6).abs() < 1e-12);
        assert!((mean.mae - 3.0).abs() < 1e-12);
        assert!((mean.rmse - 4.0).abs() < 1e-12);
        assert!(RegressionMetrics::mean(&[]).is_none());
    }
}
