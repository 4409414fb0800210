//! Saving and loading fitted models as JSON
//!
//! A model is stored under a file name derived from its label, so the best
//! model of a run can be reloaded by name and applied to new data without
//! retraining.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use boxoffice_stats::metrics::RegressionMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TrainedModel;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistError {
    #[display("failed to create {}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[display("failed to open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[display("failed to serialize model")]
    Serialize { source: serde_json::Error },
    #[display("failed to parse model file {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Cross-validated scores stored with a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredMetrics {
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
}

impl From<RegressionMetrics> for StoredMetrics {
    fn from(m: RegressionMetrics) -> Self {
        Self {
            r2: m.r2,
            mae: m.mae,
            rmse: m.rmse,
        }
    }
}

/// Everything needed to apply a fitted model to a processed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    pub label: String,
    pub trained_at: DateTime<Utc>,
    /// Feature columns in the order the model expects them
    pub feature_names: Vec<String>,
    pub target: String,
    pub cv_metrics: Option<StoredMetrics>,
    pub model: TrainedModel,
}

/// File name for a model label: lowercase, spaces become underscores
///
/// ```
/// use boxoffice_training::persistence::model_file_name;
///
/// assert_eq!(model_file_name("Random Forest"), "random_forest.json");
/// assert_eq!(model_file_name("Gradient Boosting"), "gradient_boosting.json");
/// ```
#[must_use]
pub fn model_file_name(label: &str) -> String {
    format!("{}.json", label.to_lowercase().replace(' ', "_"))
}

/// Writes `record` to `<dir>/<model_file_name(label)>` and returns the path
///
/// The JSON is written to a hidden temporary file first and renamed into place.
pub fn save_model(record: &PersistedModel, dir: &Path) -> Result<PathBuf, PersistError> {
    fs::create_dir_all(dir).map_err(|source| PersistError::Create {
        path: dir.to_owned(),
        source,
    })?;
    let file_name = model_file_name(&record.label);
    let path = dir.join(&file_name);
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let result = write_json(record, &tmp_path).and_then(|()| {
        fs::rename(&tmp_path, &path).map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;
    tracing::info!(model = %record.label, path = %path.display(), "saved model");
    Ok(path)
}

fn write_json(record: &PersistedModel, path: &Path) -> Result<(), PersistError> {
    let file = File::create(path).map_err(|source| PersistError::Create {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, record)
        .map_err(|source| PersistError::Serialize { source })?;
    writer.flush().map_err(|source| PersistError::Write {
        path: path.to_owned(),
        source,
    })
}

pub fn load_model(path: &Path) -> Result<PersistedModel, PersistError> {
    let file = File::open(path).map_err(|source| PersistError::Open {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Parse {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forest::{ForestParams, RandomForestRegressor},
        tree::{MaxFeatures, TreeParams},
    };

    #[test]
    fn test_save_and_reload_predicts_identically() {
        let rows = (0..20).map(|i| vec![f64::from(i), f64::NAN]).collect::<Vec<_>>();
        let target = rows.iter().map(|r| r[0] * 2.0).collect::<Vec<_>>();
        let params = ForestParams {
            n_trees: 3,
            tree: TreeParams {
                max_features: MaxFeatures::All,
                ..TreeParams::default()
            },
            ..ForestParams::default()
        };
        let record = PersistedModel {
            label: "Random Forest".to_owned(),
            trained_at: Utc::now(),
            feature_names: vec!["x".to_owned(), "empty".to_owned()],
            target: "y".to_owned(),
            cv_metrics: Some(StoredMetrics {
                r2: 0.9,
                mae: 1.0,
                rmse: 1.5,
            }),
            model: TrainedModel::RandomForest(RandomForestRegressor::fit(&rows, &target, &params)),
        };

        let dir = std::env::temp_dir().join(format!("boxoffice-persist-{}", std::process::id()));
        let path = save_model(&record, &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "random_forest.json");

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.feature_names, record.feature_names);
        for (a, b) in loaded
            .model
            .predict(&rows)
            .iter()
            .zip(record.model.predict(&rows))
        {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(!dir.join(".random_forest.json.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_model(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, PersistError::Open { .. }));
    }
}
