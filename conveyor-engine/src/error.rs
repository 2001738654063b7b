// Engine-level error types

use thiserror::Error;

/// Top-level error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("validation error: {0}")]
    Validation(#[from] crate::execution::ValidationError),

    #[error("artifact error: {0}")]
    Artifact(#[from] crate::artifacts::ArtifactError),

    #[error("coverage error: {0}")]
    Coverage(#[from] crate::coverage::CoverageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
