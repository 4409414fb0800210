//! Feature matrix and target vector extracted from a processed table

use boxoffice_analysis::frame::{self, FrameError};
use polars::prelude::DataFrame;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("target column is invalid")]
    Target { source: FrameError },
    #[display("feature column is invalid")]
    Feature { source: FrameError },
    #[display("target has no value in row {row}")]
    MissingTarget { row: usize },
    #[display("table has no feature columns")]
    NoFeatures,
    #[display("table has no rows")]
    Empty,
}

/// Dense row-major feature matrix with its target
///
/// Null feature cells become `NaN`; the tree learners order them below every
/// observed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    target: Vec<f64>,
}

impl Dataset {
    /// Builds a dataset from raw parts
    ///
    /// # Panics
    ///
    /// Panics if row widths do not match the feature names or the target length
    /// does not match the row count.
    #[must_use]
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>, target: Vec<f64>) -> Self {
        assert_eq!(rows.len(), target.len());
        assert!(rows.iter().all(|r| r.len() == feature_names.len()));
        Self {
            feature_names,
            rows,
            target,
        }
    }

    /// Splits `table` into the `target` column and every other column as features
    pub fn from_table(table: &DataFrame, target: &str) -> Result<Self, DatasetError> {
        let target_values = frame::numbers(table, target)
            .map_err(|source| DatasetError::Target { source })?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or(DatasetError::MissingTarget { row }))
            .collect::<Result<Vec<_>, _>>()?;
        if target_values.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut feature_names = Vec::new();
        let mut rows = vec![Vec::new(); table.height()];
        for name in frame::column_names(table).into_iter().filter(|n| n != target) {
            let values = frame::numbers(table, &name)
                .map_err(|source| DatasetError::Feature { source })?;
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value.unwrap_or(f64::NAN));
            }
            feature_names.push(name);
        }
        if feature_names.is_empty() {
            return Err(DatasetError::NoFeatures);
        }

        Ok(Self {
            feature_names,
            rows,
            target: target_values,
        })
    }

    /// Feature rows of `table` in the column order given by `feature_names`
    pub fn features_from_table(
        table: &DataFrame,
        feature_names: &[String],
    ) -> Result<Vec<Vec<f64>>, FrameError> {
        let columns = feature_names
            .iter()
            .map(|name| frame::numbers(table, name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..table.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|c| c[row].unwrap_or(f64::NAN))
                    .collect()
            })
            .collect())
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Copies the rows at `indices`, in that order
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
        }
    }
}
