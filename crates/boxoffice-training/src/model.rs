//! Model menu and fitted model handle

use serde::{Deserialize, Serialize};

use crate::{
    boosting::{BoostingParams, GradientBoostingRegressor},
    forest::{ForestParams, RandomForestRegressor},
};

/// Model family with its hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest(ForestParams),
    GradientBoosting(BoostingParams),
}

impl ModelKind {
    /// Fits a model of this kind on `rows` and `target`
    #[must_use]
    pub fn fit(&self, rows: &[Vec<f64>], target: &[f64]) -> TrainedModel {
        match self {
            Self::RandomForest(params) => {
                TrainedModel::RandomForest(RandomForestRegressor::fit(rows, target, params))
            }
            Self::GradientBoosting(params) => {
                TrainedModel::GradientBoosting(GradientBoostingRegressor::fit(rows, target, params))
            }
        }
    }
}

/// Labeled entry of the model menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub label: String,
    #[serde(flatten)]
    pub kind: ModelKind,
}

impl ModelConfig {
    /// Default menu: a bagged forest, then gradient boosting
    ///
    /// ```
    /// use boxoffice_training::model::ModelConfig;
    ///
    /// let labels = ModelConfig::default_menu()
    ///     .into_iter()
    ///     .map(|m| m.label)
    ///     .collect::<Vec<_>>();
    /// assert_eq!(labels, ["Random Forest", "Gradient Boosting"]);
    /// ```
    #[must_use]
    pub fn default_menu() -> Vec<Self> {
        vec![
            Self {
                label: "Random Forest".to_owned(),
                kind: ModelKind::RandomForest(ForestParams::default()),
            },
            Self {
                label: "Gradient Boosting".to_owned(),
                kind: ModelKind::GradientBoosting(BoostingParams::default()),
            },
        ]
    }
}

/// A fitted regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl TrainedModel {
    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Self::RandomForest(m) => m.predict_row(row),
            Self::GradientBoosting(m) => m.predict_row(row),
        }
    }

    #[must_use]
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Per-feature importances, when the model family exposes them
    #[must_use]
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            Self::RandomForest(m) => Some(m.feature_importances()),
            Self::GradientBoosting(m) => Some(m.feature_importances()),
        }
    }
}
