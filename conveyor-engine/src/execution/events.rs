// Execution progress events
// Emitted over an unbounded channel while a pipeline runs so that callers
// (the CLI, a UI) can render progress without blocking the executor.

use crate::execution::results::{JobResult, StageResult};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type ProgressSender = mpsc::UnboundedSender<ExecutionEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ExecutionEvent>;

#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        name: String,
        pipeline_id: String,
    },
    StageStarted {
        stage_name: String,
        stage_index: usize,
    },
    JobStarted {
        job_name: String,
        stage_name: String,
    },
    /// A line of combined job output.
    JobOutput {
        job_name: String,
        line: String,
    },
    JobCompleted {
        result: JobResult,
    },
    /// Declared artifact pattern matched nothing; soft warning.
    ArtifactMissing {
        job_name: String,
        pattern: String,
    },
    StageCompleted {
        result: StageResult,
        stage_index: usize,
    },
    PipelineCompleted {
        success: bool,
        failed_jobs: usize,
        skipped_jobs: usize,
        blocked_jobs: usize,
    },
}

/// Create a progress channel pair.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Wrap a progress receiver as a `Stream` for async consumers.
pub fn event_stream(rx: ProgressReceiver) -> UnboundedReceiverStream<ExecutionEvent> {
    UnboundedReceiverStream::new(rx)
}
