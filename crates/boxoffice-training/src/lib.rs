//! Model training and evaluation for processed box-office tables.
//!
//! This crate fits tree-ensemble regressors that predict tickets sold per
//! session from the numeric table produced by `boxoffice-analysis`, compares
//! them with hold-out and cross-validated scores, and persists the winner.
//!
//! # Architecture
//!
//! ```text
//! Processed table
//!     ↓ Dataset::from_table
//! Feature matrix + target
//!     ↓ Evaluator (hold-out split, K-fold on scoped threads)
//! Per-model scores → ranking by CV R²
//!     ↓ Evaluator::fit_best (all rows)
//! Best model → persistence::save_model
//! ```
//!
//! # Models
//!
//! - [`forest::RandomForestRegressor`]: bootstrap-bagged regression trees
//! - [`boosting::GradientBoostingRegressor`]: least-squares boosting with row subsampling
//!
//! Both are built on [`tree::RegressionTree`] and both expose normalized
//! impurity-based feature importances.
//!
//! # Reproducibility
//!
//! Every random choice (row shuffles, bootstrap draws, feature sampling, row
//! subsampling) comes from a `Pcg64` seeded from configuration, so repeated
//! runs produce identical scores, rankings and models.
//!
//! # Example
//!
//! ```
//! use boxoffice_training::{
//!     dataset::Dataset,
//!     evaluation::{EvaluationConfig, Evaluator},
//!     forest::ForestParams,
//!     model::{ModelConfig, ModelKind},
//! };
//!
//! let rows = (0..50).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
//! let target = rows.iter().map(|r| 2.0 * r[0]).collect();
//! let dataset = Dataset::new(vec!["x".into()], rows, target);
//!
//! let menu = vec![ModelConfig {
//!     label: "Small Forest".into(),
//!     kind: ModelKind::RandomForest(ForestParams { n_trees: 10, ..Default::default() }),
//! }];
//! let evaluator = Evaluator::new(EvaluationConfig::default(), menu);
//! let report = evaluator.evaluate(&dataset)?;
//! assert_eq!(report.best().unwrap().label, "Small Forest");
//! # Ok::<(), boxoffice_training::evaluation::EvaluationError>(())
//! ```

pub mod boosting;
pub mod dataset;
pub mod evaluation;
pub mod forest;
pub mod model;
pub mod persistence;
pub mod split;
pub mod tree;
