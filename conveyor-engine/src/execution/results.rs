// Execution results
// Per-job, per-stage, and pipeline-level outcomes, serializable for the
// machine-readable summary.

use crate::coverage::CoverageReport;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Trigger predicate was false for this run.
    Skipped,
    /// A transitive dependency failed; the job never ran.
    Blocked,
    /// The run was cancelled before or while the job ran.
    Canceled,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Does this status make the pipeline fail?
    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Canceled)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_name: String,
    pub stage_name: String,
    pub status: JobStatus,
    /// Exit code of the first failing command, or of the last command.
    pub exit_code: Option<i32>,
    /// Combined output of all commands (also retained as a log artifact).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub duration: Duration,
    /// Paths captured into the artifact store.
    pub artifacts: Vec<PathBuf>,
    /// Present on report jobs that aggregated coverage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageReport>,
}

impl JobResult {
    /// A result for a job that never ran (skipped, blocked, cancelled).
    pub fn not_run(job_name: &str, stage_name: &str, status: JobStatus) -> Self {
        Self {
            job_name: job_name.to_string(),
            stage_name: stage_name.to_string(),
            status,
            exit_code: None,
            output: String::new(),
            error: None,
            duration: Duration::ZERO,
            artifacts: Vec::new(),
            coverage: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage_name: String,
    pub jobs: Vec<JobResult>,
    #[serde(skip)]
    pub duration: Duration,
}

impl StageResult {
    pub fn failed(&self) -> bool {
        self.jobs.iter().any(|j| j.status.is_failure())
    }
}

/// Outcome of a whole pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub pipeline_name: String,
    pub pipeline_id: String,
    pub stages: Vec<StageResult>,
    #[serde(skip)]
    pub duration: Duration,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        !self.stages.iter().any(|s| s.failed())
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobResult> {
        self.stages.iter().flat_map(|s| s.jobs.iter())
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs().filter(|j| j.status == status).count()
    }

    /// Render the per-job summary table shown at the end of a run.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for stage in &self.stages {
            out.push_str(&format!("stage {}\n", stage.stage_name));
            for job in &stage.jobs {
                out.push_str(&format!(
                    "  {:<24} {:<10} {:>6}ms\n",
                    job.job_name,
                    status_label(job.status),
                    job.duration.as_millis()
                ));
            }
        }
        out.push_str(&format!(
            "result: {} ({} failed, {} skipped, {} blocked)\n",
            if self.success() { "success" } else { "failure" },
            self.count(JobStatus::Failed),
            self.count(JobStatus::Skipped),
            self.count(JobStatus::Blocked),
        ));
        out
    }
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Running => "running",
        JobStatus::Succeeded => "ok",
        JobStatus::Failed => "failed",
        JobStatus::Skipped => "skipped",
        JobStatus::Blocked => "blocked",
        JobStatus::Canceled => "canceled",
    }
}
