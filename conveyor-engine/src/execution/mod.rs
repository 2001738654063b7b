// Pipeline execution
// Plan validation, the dependency-ordered executor, progress events, and
// run results.

pub mod events;
pub mod executor;
pub mod graph;
pub mod results;

pub use events::{
    event_stream, progress_channel, ExecutionEvent, ProgressReceiver, ProgressSender,
};
pub use executor::{CancelHandle, PipelineExecutor};
pub use graph::{ExecutionPlan, StagePlan, ValidationError};
pub use results::{JobResult, JobStatus, PipelineResult, StageResult};
