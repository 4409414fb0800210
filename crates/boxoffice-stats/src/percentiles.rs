//! Nearest-rank percentiles
//!
//! The value reported for percentile `p` of `n` sorted values is the element
//! at index `floor(n * p / 100)`, clamped to the last element. No
//! interpolation is performed, so every reported value is an observed value.
//!
//! ```
//! use boxoffice_stats::percentiles::Percentiles;
//!
//! let prices = [0.0, 10.0, 10.0, 20.0, 35.0, 50.0];
//! let quartiles = Percentiles::new(&prices, &[25.0, 50.0, 75.0]);
//!
//! assert_eq!(quartiles.get(25.0), Some(10.0));
//! assert_eq!(quartiles.get(50.0), Some(20.0));
//! assert_eq!(quartiles.get(75.0), Some(35.0));
//! assert_eq!(quartiles.get(90.0), None);
//! ```

/// Requested percentile points with their values
#[derive(Debug, Clone, PartialEq)]
pub struct Percentiles {
    points: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes the requested `points` (0 to 100) over unsorted `values`
    ///
    /// Every value is `NaN` when `values` is empty.
    #[must_use]
    pub fn new(values: &[f64], points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let points = points
            .iter()
            .map(|&p| (p, nearest_rank(&sorted, p)))
            .collect();
        Self { points }
    }

    /// Value at `point`, `None` when it was not requested
    #[must_use]
    pub fn get(&self, point: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|(p, _)| (p - point).abs() < f64::EPSILON)
            .map(|&(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}

/// Nearest-rank percentile of ascending `sorted` values
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn nearest_rank(sorted: &[f64], point: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = (sorted.len() as f64 * point / 100.0).max(0.0) as usize;
    sorted[rank.min(last)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsorted_input() {
        let quartiles = Percentiles::new(&[5.0, 1.0, 4.0, 2.0, 3.0], &[0.0, 50.0, 100.0]);
        assert_eq!(
            quartiles.iter().collect::<Vec<_>>(),
            vec![(0.0, 1.0), (50.0, 3.0), (100.0, 5.0)]
        );
    }

    #[test]
    fn test_empty_values() {
        let quartiles = Percentiles::new(&[], &[50.0]);
        assert!(quartiles.get(50.0).unwrap().is_nan());
    }

    #[test]
    fn test_single_value() {
        assert_eq!(nearest_rank(&[7.0], 25.0), 7.0);
        assert_eq!(nearest_rank(&[7.0], 100.0), 7.0);
    }
}
