//! Column-level summary statistics
//!
//! [`DescriptiveStats`] holds what the exploration report prints for a numeric
//! column: count, mean, sample standard deviation, extremes and median.
//! Callers drop nulls before summarizing.

/// Summary of a non-empty set of values
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Standard deviation with the `n - 1` denominator, `NaN` for a single value
    pub sample_std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes `values` in any order, `None` when there are none
    ///
    /// ```
    /// use boxoffice_stats::descriptive::DescriptiveStats;
    ///
    /// let sold = [12.0, 35.0, 80.0, 35.0];
    /// let stats = DescriptiveStats::new(sold).unwrap();
    /// assert_eq!((stats.count, stats.min, stats.max), (4, 12.0, 80.0));
    /// assert_eq!(stats.median, 35.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };
        let squared_deviation = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let sample_std_dev = if count > 1 {
            (squared_deviation / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            sample_std_dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new([]).is_none());
    }

    #[test]
    fn test_sample_std_dev() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.median - 4.5).abs() < 1e-12);
        assert!((stats.sample_std_dev - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 42.0);
        assert!(stats.sample_std_dev.is_nan());
    }
}
