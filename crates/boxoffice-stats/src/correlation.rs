//! Pearson and Spearman correlation between numeric series.
//!
//! Pairs where either side is `NaN` are skipped (pairwise-complete
//! observations). A series without variance yields `NaN`.
//!
//! Spearman's coefficient is the Pearson coefficient of the ranks, with tied
//! values sharing the average of the ranks they span.
//!
//! ```
//! use boxoffice_stats::correlation::{pearson, spearman};
//!
//! let price = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let revenue = price.map(|p: f64| p.powi(3));
//! assert!((spearman(&price, &revenue) - 1.0).abs() < 1e-12);
//! assert!(pearson(&price, &revenue) < 1.0);
//! ```

use std::iter;

/// Pearson correlation coefficient of two equally long series.
///
/// # Examples
///
/// ```
/// use boxoffice_stats::correlation::pearson;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.0, 6.0, 8.0];
/// assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    let pairs = iter::zip(x, y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Ranks starting at 1, ties sharing their average rank
///
/// ```
/// use boxoffice_stats::correlation::average_ranks;
///
/// assert_eq!(average_ranks(&[10.0, 30.0, 20.0, 30.0]), [1.0, 3.5, 2.0, 3.5]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation of two equally long series.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    let (x, y): (Vec<f64>, Vec<f64>) = iter::zip(x, y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();
    pearson(&average_ranks(&x), &average_ranks(&y))
}

/// Coefficient used to build a correlation matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    #[default]
    Spearman,
}

impl CorrelationMethod {
    #[must_use]
    pub fn coefficient(self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Pearson => pearson(x, y),
            Self::Spearman => spearman(x, y),
        }
    }
}

/// Symmetric correlation matrix of the given series.
///
/// `matrix[i][j]` is the correlation of `series[i]` and `series[j]`; the
/// diagonal is `1.0` unless the series is constant.
#[must_use]
pub fn correlation_matrix(series: &[&[f64]], method: CorrelationMethod) -> Vec<Vec<f64>> {
    let n = series.len();
    let mut matrix = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = method.coefficient(series[i], series[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}
