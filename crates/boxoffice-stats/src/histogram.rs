//! Equal-width histograms
//!
//! Bins split `[min, max]` of the values into equal intervals. Every bin is
//! half-open except the last, which also holds `max`. When all values are
//! equal the range is widened to `[v - 0.5, v + 0.5]`.
//!
//! ```
//! use boxoffice_stats::histogram::Histogram;
//!
//! let histogram = Histogram::new(&[0.0, 1.0, 1.5, 4.0], 4).unwrap();
//! assert_eq!(histogram.counts(), [1, 2, 0, 1]);
//! assert_eq!(histogram.edges(), [0.0, 1.0, 2.0, 3.0, 4.0]);
//! ```

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}

impl Histogram {
    /// Bins the finite `values` into `bins` intervals
    ///
    /// Returns `None` when there is no finite value or `bins` is zero.
    #[expect(
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.clone().fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })?;
        if bins == 0 {
            return None;
        }
        let (min, max) = if min < max {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        let width = (max - min) / bins as f64;
        let edges = (0..=bins)
            .map(|i| if i == bins { max } else { min + width * i as f64 })
            .collect();
        let mut counts = vec![0; bins];
        for v in finite {
            let bin = ((v - min) / width) as usize;
            counts[bin.min(bins - 1)] += 1;
        }
        Some(Self { edges, counts })
    }

    /// Bin boundaries, one more than the number of bins
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximum_falls_in_last_bin() {
        let values = (0..=100).map(f64::from).collect::<Vec<_>>();
        let histogram = Histogram::new(&values, 50).unwrap();
        assert_eq!(histogram.counts().len(), 50);
        assert_eq!(histogram.counts().iter().sum::<usize>(), 101);
        assert_eq!(histogram.counts()[49], 3);
    }

    #[test]
    fn test_constant_values() {
        let histogram = Histogram::new(&[2.0, 2.0], 2).unwrap();
        assert_eq!(histogram.edges(), [1.5, 2.0, 2.5]);
        assert_eq!(histogram.counts(), [0, 2]);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        assert!(Histogram::new(&[f64::NAN], 10).is_none());
        assert!(Histogram::new(&[1.0], 0).is_none());
        let histogram = Histogram::new(&[f64::NAN, 1.0, f64::INFINITY, 3.0], 2).unwrap();
        assert_eq!(histogram.counts(), [1, 1]);
    }
}
