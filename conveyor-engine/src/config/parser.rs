// Pipeline file parser
// Loads and deserializes a pipeline YAML file into the raw config model.

use crate::config::models::PipelineConfig;
use crate::config::ConfigError;

use std::path::Path;

pub struct PipelineParser;

impl PipelineParser {
    /// Parse pipeline YAML content.
    pub fn parse(content: &str) -> Result<PipelineConfig, ConfigError> {
        let config: PipelineConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            })?;

        if config.stages.is_empty() {
            return Err(ConfigError::Parse {
                message: "pipeline declares no stages".to_string(),
            });
        }

        Ok(config)
    }

    /// Parse a pipeline YAML file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }
}
