// Pipeline configuration
// Raw YAML model, file parsing, and template resolution.

pub mod models;
pub mod parser;
pub mod template;

pub use models::{
    ArtifactPolicy, ArtifactsConfig, CoverageConfig, Job, JobConfig, JobKind, JobTemplate,
    PipelineConfig, TriggerKind,
};
pub use parser::PipelineParser;
pub use template::resolve_jobs;

use thiserror::Error;

/// Errors raised while loading or resolving a pipeline definition.
/// All of these abort before any job runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pipeline file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse pipeline: {message}")]
    Parse { message: String },

    #[error("job '{job}' extends unknown template '{template}'")]
    UnknownTemplate { job: String, template: String },

    #[error("job '{job}' is assigned to undeclared stage '{stage}'")]
    UnknownStage { job: String, stage: String },

    #[error("job '{job}' declares coverage settings but its kind is not 'report'")]
    CoverageWithoutReportKind { job: String },
}
