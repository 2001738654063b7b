// Conveyor Engine
// Dependency-ordered CI pipeline execution: shared job templates, stage
// barriers, artifact passing between stages, and coverage aggregation.

pub mod artifacts;
pub mod config;
pub mod context;
pub mod coverage;
pub mod error;
pub mod execution;
pub mod runners;

// Re-export commonly used types
pub use artifacts::ArtifactStore;
pub use config::{
    resolve_jobs, ArtifactPolicy, ConfigError, Job, JobKind, PipelineConfig, PipelineParser,
    TriggerKind,
};
pub use context::RunContext;
pub use coverage::{extract_total_percent, CoverageData, CoverageReport};
pub use error::{EngineError, EngineResult};
pub use execution::{
    CancelHandle, ExecutionEvent, ExecutionPlan, JobResult, JobStatus, PipelineExecutor,
    PipelineResult, ProgressReceiver, ProgressSender, ValidationError,
};
pub use runners::{CommandOutput, CommandRunner, ShellRunner};

/// A parsed, template-resolved, validated pipeline, ready to execute.
pub struct LoadedPipeline {
    pub config: PipelineConfig,
    pub jobs: Vec<Job>,
    pub plan: ExecutionPlan,
}

impl LoadedPipeline {
    pub fn name(&self) -> &str {
        self.config.pipeline.as_deref().unwrap_or("unnamed")
    }
}

/// Load a pipeline file, resolve its templates, and validate the job graph.
/// Every validation error is reported here, before any job runs.
pub fn load_pipeline(path: impl AsRef<std::path::Path>) -> EngineResult<LoadedPipeline> {
    let config = PipelineParser::from_file(path)?;
    let jobs = resolve_jobs(&config)?;
    let plan = ExecutionPlan::build(&config.stages, &jobs)?;
    Ok(LoadedPipeline { config, jobs, plan })
}
