//! Hold-out and cross-validated comparison of the model menu
//!
//! For every model in the menu the evaluator:
//!
//! 1. fits on a seeded hold-out training split and scores the held-out rows,
//!    keeping the top feature importances of that fit
//! 2. runs shuffled K-fold cross-validation and averages R², MAE and RMSE
//!
//! Models are then ranked by mean cross-validated R², highest first. The sort
//! is stable, so tied models keep their menu order.
//!
//! Folds are fitted on scoped threads and their scores collected in fold
//! order. Fold membership depends only on the seed, so the reported numbers
//! do not depend on scheduling.

use std::{cmp::Ordering, thread};

use boxoffice_stats::metrics::RegressionMetrics;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    model::{ModelConfig, TrainedModel},
    split::{KFold, train_test_split},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Target column of the processed table
    pub target: String,
    pub test_fraction: f64,
    pub n_folds: usize,
    pub seed: u64,
    /// Number of feature importances reported per model
    pub top_importances: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            target: "quantidade_de_ingressos_vendidos".to_owned(),
            test_fraction: 0.2,
            n_folds: 5,
            seed: 42,
            top_importances: 5,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display("model menu is empty")]
    EmptyMenu,
    #[display("cross-validation needs at least 2 folds, got {folds}")]
    TooFewFolds { folds: usize },
    #[display("{rows} rows are too few for {folds}-fold cross-validation")]
    TooFewRows { rows: usize, folds: usize },
}

#[derive(Debug, Clone)]
pub struct ModelEvaluation {
    pub label: String,
    pub holdout: RegressionMetrics,
    pub folds: Vec<RegressionMetrics>,
    pub cv: RegressionMetrics,
    /// Largest importances of the hold-out fit, `None` when the model has none
    pub top_importances: Option<Vec<(String, f64)>>,
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// One entry per model, in menu order
    pub evaluations: Vec<ModelEvaluation>,
    /// Indices into `evaluations`, best first
    pub ranking: Vec<usize>,
}

impl EvaluationReport {
    pub fn ranked(&self) -> impl Iterator<Item = &ModelEvaluation> + '_ {
        self.ranking.iter().map(|&i| &self.evaluations[i])
    }

    #[must_use]
    pub fn best(&self) -> Option<&ModelEvaluation> {
        self.ranked().next()
    }
}

/// Orders evaluations by cross-validated R², highest first, ties in input order
#[must_use]
pub fn rank_by_cv_r2(evaluations: &[ModelEvaluation]) -> Vec<usize> {
    let key = |i: usize| {
        let r2 = evaluations[i].cv.r2;
        if r2.is_nan() { f64::NEG_INFINITY } else { r2 }
    };
    let mut ranking = (0..evaluations.len()).collect::<Vec<_>>();
    ranking.sort_by(|&a, &b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    ranking
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluationConfig,
    models: Vec<ModelConfig>,
}

impl Evaluator {
    #[must_use]
    pub fn new(config: EvaluationConfig, models: Vec<ModelConfig>) -> Self {
        Self { config, models }
    }

    #[must_use]
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    #[must_use]
    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn evaluate(&self, dataset: &Dataset) -> Result<EvaluationReport, EvaluationError> {
        if self.models.is_empty() {
            return Err(EvaluationError::EmptyMenu);
        }
        let folds = self.checked_folds()?;
        if dataset.len() < folds {
            return Err(EvaluationError::TooFewRows {
                rows: dataset.len(),
                folds,
            });
        }

        let evaluations = self
            .models
            .iter()
            .map(|model| self.evaluate_model(model, dataset))
            .collect::<Result<Vec<_>, _>>()?;
        let ranking = rank_by_cv_r2(&evaluations);
        Ok(EvaluationReport {
            evaluations,
            ranking,
        })
    }

    fn checked_folds(&self) -> Result<usize, EvaluationError> {
        match self.config.n_folds {
            folds @ 0..2 => Err(EvaluationError::TooFewFolds { folds }),
            folds => Ok(folds),
        }
    }

    fn evaluate_model(
        &self,
        model: &ModelConfig,
        dataset: &Dataset,
    ) -> Result<ModelEvaluation, EvaluationError> {
        tracing::info!(model = %model.label, "evaluating");

        let split = train_test_split(dataset.len(), self.config.test_fraction, self.config.seed);
        let train = dataset.subset(&split.train);
        let test = dataset.subset(&split.test);
        let fitted = model.kind.fit(train.rows(), train.target());
        let holdout = RegressionMetrics::compute(test.target(), &fitted.predict(test.rows()));
        tracing::info!(
            model = %model.label,
            r2 = holdout.r2,
            mae = holdout.mae,
            rmse = holdout.rmse,
            "hold-out scores"
        );
        let top_importances = fitted
            .feature_importances()
            .map(|imp| top_k(dataset.feature_names(), imp, self.config.top_importances));

        let folds = self.cross_validate(model, dataset)?;
        let cv = RegressionMetrics::mean(&folds).unwrap_or(RegressionMetrics {
            r2: f64::NAN,
            mae: f64::NAN,
            rmse: f64::NAN,
        });
        tracing::info!(
            model = %model.label,
            r2 = cv.r2,
            mae = cv.mae,
            rmse = cv.rmse,
            "cross-validated scores"
        );

        Ok(ModelEvaluation {
            label: model.label.clone(),
            holdout,
            folds,
            cv,
            top_importances,
        })
    }

    /// Scores of each fold, in fold order
    pub fn cross_validate(
        &self,
        model: &ModelConfig,
        dataset: &Dataset,
    ) -> Result<Vec<RegressionMetrics>, EvaluationError> {
        let splits = KFold::new(self.checked_folds()?, self.config.seed).split(dataset.len());
        let mut scores = vec![None; splits.len()];
        thread::scope(|s| {
            for (split, slot) in splits.iter().zip(&mut scores) {
                s.spawn(move || {
                    let train = dataset.subset(&split.train);
                    let test = dataset.subset(&split.test);
                    let fitted = model.kind.fit(train.rows(), train.target());
                    *slot = Some(RegressionMetrics::compute(
                        test.target(),
                        &fitted.predict(test.rows()),
                    ));
                });
            }
        });
        Ok(scores.into_iter().flatten().collect())
    }

    /// Refits the best-ranked model on every row of `dataset`
    #[must_use]
    pub fn fit_best(
        &self,
        report: &EvaluationReport,
        dataset: &Dataset,
    ) -> Option<(ModelConfig, TrainedModel)> {
        let best = report.ranking.first().map(|&i| &self.models[i])?;
        tracing::info!(model = %best.label, rows = dataset.len(), "refitting best model");
        Some((best.clone(), best.kind.fit(dataset.rows(), dataset.target())))
    }
}

/// Names and values of the `k` largest importances, largest first
#[must_use]
pub fn top_k(names: &[String], importances: &[f64], k: usize) -> Vec<(String, f64)> {
    let mut pairs = names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect::<Vec<_>>();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(k);
    pairs
}
