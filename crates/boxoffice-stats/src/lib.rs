//! Statistical utilities for the box-office analytics pipeline.
//!
//! This crate provides the numeric building blocks shared by the analysis and
//! training crates:
//!
//! - **Descriptive statistics**: count, mean, sample standard deviation, min, max, median
//! - **Percentiles**: nearest-rank quartiles for exploration summaries
//! - **Regression metrics**: R², mean absolute error, root-mean-squared error
//! - **Correlation**: Pearson and Spearman coefficients and matrices
//! - **Histograms**: equal-width binning for exploratory charts
//!
//! # Modules
//!
//! - [`descriptive`]: Summary statistics of a numeric column
//! - [`percentiles`]: Nearest-rank percentiles
//! - [`metrics`]: Scores comparing predictions against observed targets
//! - [`correlation`]: Pairwise linear and rank correlation
//! - [`histogram`]: Equal-width bin counts
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use boxoffice_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Scoring predictions
//!
//! ```
//! use boxoffice_stats::metrics::RegressionMetrics;
//!
//! let observed = [3.0, 5.0, 7.0];
//! let predicted = [3.0, 5.0, 7.0];
//! let metrics = RegressionMetrics::compute(&observed, &predicted);
//! assert_eq!(metrics.r2, 1.0);
//! assert_eq!(metrics.mae, 0.0);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod histogram;
pub mod metrics;
pub mod percentiles;
