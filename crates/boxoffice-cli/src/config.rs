use std::path::Path;

use boxoffice_analysis::config::PipelineConfig;
use boxoffice_training::{evaluation::EvaluationConfig, model::ModelConfig};
use serde::{Deserialize, Serialize};

use crate::util::read_json_file;

/// Settings shared by every subcommand, loaded from `--config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub preprocessing: PipelineConfig,
    pub evaluation: EvaluationConfig,
    pub models: Vec<ModelConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preprocessing: PipelineConfig::default(),
            evaluation: EvaluationConfig::default(),
            models: ModelConfig::default_menu(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config: Self = read_json_file("config", path)?;
        tracing::info!(path = %path.display(), models = config.models.len(), "loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "evaluation": { "n_folds": 3 } }"#).unwrap();
        assert_eq!(config.evaluation.n_folds, 3);
        assert_eq!(config.evaluation.seed, 42);
        assert_eq!(config.models, ModelConfig::default_menu());
        assert_eq!(config.preprocessing, PipelineConfig::default());
    }
}
