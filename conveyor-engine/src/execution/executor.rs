// Dependency-ordered pipeline executor
// Runs stages in declared order with a hard barrier between them; jobs
// inside a stage run concurrently as spawned tasks. Failure blocks
// transitive dependents while independent branches continue.

use crate::artifacts::ArtifactStore;
use crate::config::models::{Job, JobKind};
use crate::context::RunContext;
use crate::coverage::{self, CoverageReport};
use crate::execution::events::{ExecutionEvent, ProgressSender};
use crate::execution::graph::ExecutionPlan;
use crate::execution::results::{JobResult, JobStatus, PipelineResult, StageResult};
use crate::runners::{CommandRunner, ShellRunner};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Handle for cancelling a run from outside the executor.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct PipelineExecutor {
    context: RunContext,
    store: ArtifactStore,
    runner: Arc<dyn CommandRunner>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl PipelineExecutor {
    pub fn new(context: RunContext) -> Self {
        Self::with_runner(context, Arc::new(ShellRunner::new()))
    }

    pub fn with_runner(context: RunContext, runner: Arc<dyn CommandRunner>) -> Self {
        let store = ArtifactStore::new(context.artifact_root());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            context,
            store,
            runner,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Execute a validated plan over resolved jobs.
    ///
    /// Stage N+1 never starts before every stage-N job is terminal. Within a
    /// stage, jobs are spawned in plan order and joined in plan order, so a
    /// run with no failures produces an identical execution order every
    /// time.
    pub async fn execute(
        &self,
        pipeline_name: &str,
        jobs: &[Job],
        plan: &ExecutionPlan,
        progress: Option<ProgressSender>,
    ) -> PipelineResult {
        let run_start = Instant::now();
        emit(
            &progress,
            ExecutionEvent::PipelineStarted {
                name: pipeline_name.to_string(),
                pipeline_id: self.context.pipeline_id.clone(),
            },
        );

        let mut statuses: HashMap<String, JobStatus> = jobs
            .iter()
            .map(|j| (j.name.clone(), JobStatus::Pending))
            .collect();
        let mut stage_results = Vec::with_capacity(plan.stages.len());

        for (stage_index, stage) in plan.stages.iter().enumerate() {
            let stage_start = Instant::now();
            emit(
                &progress,
                ExecutionEvent::StageStarted {
                    stage_name: stage.name.clone(),
                    stage_index,
                },
            );

            let mut handles = Vec::new();
            let mut stage_jobs = Vec::new();

            for &job_index in &stage.jobs {
                let job = &jobs[job_index];

                let decision = if self.cancelled() {
                    Some(JobStatus::Canceled)
                } else if self.dependency_blocks(job, &statuses) {
                    debug!(job = job.name.as_str(), "blocked by failed dependency");
                    Some(JobStatus::Blocked)
                } else if !self.context.job_allowed(job) {
                    debug!(job = job.name.as_str(), "trigger predicate false, skipping");
                    Some(JobStatus::Skipped)
                } else {
                    None
                };

                match decision {
                    Some(status) => {
                        statuses.insert(job.name.clone(), status);
                        let result = JobResult::not_run(&job.name, &job.stage, status);
                        emit(
                            &progress,
                            ExecutionEvent::JobCompleted {
                                result: result.clone(),
                            },
                        );
                        stage_jobs.push(StageSlot::Done(result));
                    }
                    None => {
                        statuses.insert(job.name.clone(), JobStatus::Running);
                        let task = JobTask {
                            job: job.clone(),
                            context: self.context.clone(),
                            store: self.store.clone(),
                            runner: self.runner.clone(),
                            cancel: self.cancel_rx.clone(),
                            progress: progress.clone(),
                        };
                        let handle = tokio::spawn(task.run());
                        stage_jobs.push(StageSlot::Pending(handles.len()));
                        handles.push((job.name.clone(), handle));
                    }
                }
            }

            // Barrier: join every spawned job before the next stage starts.
            let mut joined = Vec::with_capacity(handles.len());
            for (job_name, handle) in handles {
                match handle.await {
                    Ok(result) => joined.push(result),
                    Err(e) => {
                        // The failed result must carry the real job name so
                        // dependents in later stages see the failure.
                        warn!(job = job_name.as_str(), "job task panicked: {}", e);
                        joined.push(JobResult::not_run(&job_name, &stage.name, JobStatus::Failed));
                    }
                }
            }

            let mut results = Vec::with_capacity(stage_jobs.len());
            for slot in stage_jobs {
                let result = match slot {
                    StageSlot::Done(result) => result,
                    StageSlot::Pending(i) => joined[i].clone(),
                };
                statuses.insert(result.job_name.clone(), result.status);
                results.push(result);
            }

            let stage_result = StageResult {
                stage_name: stage.name.clone(),
                jobs: results,
                duration: stage_start.elapsed(),
            };
            emit(
                &progress,
                ExecutionEvent::StageCompleted {
                    result: stage_result.clone(),
                    stage_index,
                },
            );
            stage_results.push(stage_result);
        }

        let result = PipelineResult {
            pipeline_name: pipeline_name.to_string(),
            pipeline_id: self.context.pipeline_id.clone(),
            stages: stage_results,
            duration: run_start.elapsed(),
        };

        info!(
            pipeline = pipeline_name,
            success = result.success(),
            "pipeline finished"
        );
        emit(
            &progress,
            ExecutionEvent::PipelineCompleted {
                success: result.success(),
                failed_jobs: result.count(JobStatus::Failed),
                skipped_jobs: result.count(JobStatus::Skipped),
                blocked_jobs: result.count(JobStatus::Blocked),
            },
        );

        result
    }

    /// A job is blocked when any dependency failed, was blocked itself, or
    /// was cancelled. Skipped dependencies do not block: their artifacts are
    /// simply absent.
    fn dependency_blocks(&self, job: &Job, statuses: &HashMap<String, JobStatus>) -> bool {
        job.dependencies.iter().any(|dep| {
            matches!(
                statuses.get(dep),
                Some(JobStatus::Failed) | Some(JobStatus::Blocked) | Some(JobStatus::Canceled)
            )
        })
    }
}

enum StageSlot {
    Done(JobResult),
    Pending(usize),
}

/// Everything one spawned job needs, owned.
struct JobTask {
    job: Job,
    context: RunContext,
    store: ArtifactStore,
    runner: Arc<dyn CommandRunner>,
    cancel: watch::Receiver<bool>,
    progress: Option<ProgressSender>,
}

enum ScriptOutcome {
    Completed { exit_code: Option<i32>, failed: bool },
    Canceled,
    TimedOut,
}

impl JobTask {
    async fn run(self) -> JobResult {
        let start = Instant::now();
        let job_name = self.job.name.clone();
        emit(
            &self.progress,
            ExecutionEvent::JobStarted {
                job_name: job_name.clone(),
                stage_name: self.job.stage.clone(),
            },
        );

        let workspace = self.context.job_workspace(&job_name);
        if let Err(e) = std::fs::create_dir_all(&workspace) {
            return self.finish(
                start,
                JobStatus::Failed,
                None,
                String::new(),
                Some(format!("failed to create workspace: {}", e)),
                None,
            );
        }

        // Dependencies were terminal before this task was spawned; pull
        // their artifact sets in. Absent sets are soft warnings.
        let deps = self.job.dependencies.clone();
        let progress = self.progress.clone();
        if let Err(e) = self.store.materialize(&deps, &workspace, |producer| {
            emit(
                &progress,
                ExecutionEvent::ArtifactMissing {
                    job_name: job_name.clone(),
                    pattern: producer.to_string(),
                },
            );
        }) {
            return self.finish(
                start,
                JobStatus::Failed,
                None,
                String::new(),
                Some(format!("failed to materialize artifacts: {}", e)),
                None,
            );
        }

        if let Some(image) = &self.job.image {
            // Container execution belongs to the external runner; locally we
            // record which image the job asked for and run on the host.
            debug!(job = job_name.as_str(), image = image.as_str(), "requested image");
        }

        let mut env: HashMap<String, String> = self.context.base_env().into_iter().collect();
        env.insert("CI_JOB_NAME".to_string(), job_name.clone());
        env.insert("CI_JOB_STAGE".to_string(), self.job.stage.clone());

        let mut transcript = String::new();
        let outcome = self.run_script(&workspace, &env, &mut transcript).await;

        let (status, exit_code, error) = match outcome {
            ScriptOutcome::Completed { exit_code, failed } => {
                if failed {
                    (
                        JobStatus::Failed,
                        exit_code,
                        Some("command exited with non-zero status".to_string()),
                    )
                } else {
                    (JobStatus::Succeeded, exit_code, None)
                }
            }
            ScriptOutcome::Canceled => (
                JobStatus::Canceled,
                None,
                Some("run was cancelled".to_string()),
            ),
            ScriptOutcome::TimedOut => (
                JobStatus::Failed,
                None,
                Some(format!(
                    "job timed out after {:?}",
                    self.job.timeout.unwrap_or_default()
                )),
            ),
        };

        // Report jobs aggregate coverage after their script completes.
        let mut status = status;
        let mut error = error;
        let mut coverage_report = None;
        if status == JobStatus::Succeeded && self.job.kind == JobKind::Report {
            if let Some(settings) = self.job.coverage.clone() {
                match self.aggregate_coverage(&workspace, &settings, &mut transcript) {
                    Ok(report) => coverage_report = Some(report),
                    Err(e) => {
                        status = JobStatus::Failed;
                        error = Some(format!("coverage aggregation failed: {}", e));
                    }
                }
            }
        }

        self.finish(start, status, exit_code, transcript, error, coverage_report)
    }

    async fn run_script(
        &self,
        workspace: &std::path::Path,
        env: &HashMap<String, String>,
        transcript: &mut String,
    ) -> ScriptOutcome {
        let commands: Vec<String> = self.job.commands().cloned().collect();
        let deadline = self.job.timeout;
        let runner = self.runner.clone();
        let mut cancel = self.cancel.clone();
        let progress = self.progress.clone();
        let job_name = self.job.name.clone();

        let body = async {
            let mut last_exit = None;
            for command in &commands {
                if *cancel.borrow() {
                    return ScriptOutcome::Canceled;
                }

                let output = tokio::select! {
                    output = runner.run(command, env, workspace) => output,
                    _ = wait_cancel(&mut cancel) => return ScriptOutcome::Canceled,
                };

                for line in output.stdout.lines().chain(output.stderr.lines()) {
                    emit(
                        &progress,
                        ExecutionEvent::JobOutput {
                            job_name: job_name.clone(),
                            line: line.to_string(),
                        },
                    );
                }
                append_transcript(transcript, command, &output.stdout, &output.stderr);

                last_exit = output.exit_code;
                if !output.succeeded() {
                    return ScriptOutcome::Completed {
                        exit_code: last_exit,
                        failed: true,
                    };
                }
            }
            ScriptOutcome::Completed {
                exit_code: last_exit,
                failed: false,
            }
        };

        match deadline {
            Some(limit) => match tokio::time::timeout(limit, body).await {
                Ok(outcome) => outcome,
                Err(_) => ScriptOutcome::TimedOut,
            },
            None => body.await,
        }
    }

    fn aggregate_coverage(
        &self,
        workspace: &std::path::Path,
        settings: &crate::config::models::CoverageConfig,
        transcript: &mut String,
    ) -> Result<CoverageReport, crate::coverage::CoverageError> {
        let report = coverage::aggregate(workspace, &settings.inputs, settings.threshold)?;

        let text = report.render_text();
        std::fs::write(workspace.join("coverage.txt"), &text)?;
        std::fs::write(workspace.join("coverage.json"), report.to_json()?)?;
        report.write_html(&workspace.join(&settings.html_dir))?;
        transcript.push_str(&text);

        Ok(report)
    }

    fn finish(
        &self,
        start: Instant,
        status: JobStatus,
        exit_code: Option<i32>,
        transcript: String,
        error: Option<String>,
        coverage: Option<CoverageReport>,
    ) -> JobResult {
        let workspace = self.context.job_workspace(&self.job.name);
        let succeeded = status == JobStatus::Succeeded;

        // Logs are retained regardless of outcome; declared artifacts
        // follow the job's retention policy.
        if let Err(e) = self.store.store_log(&self.job.name, &transcript) {
            warn!(job = self.job.name.as_str(), "failed to store log: {}", e);
        }
        let artifacts = match self.store.capture(
            &self.job.name,
            &workspace,
            &self.job.artifacts,
            succeeded,
            |pattern| {
                emit(
                    &self.progress,
                    ExecutionEvent::ArtifactMissing {
                        job_name: self.job.name.clone(),
                        pattern: pattern.to_string(),
                    },
                );
            },
        ) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(
                    job = self.job.name.as_str(),
                    "failed to capture artifacts: {}", e
                );
                Vec::new()
            }
        };

        let result = JobResult {
            job_name: self.job.name.clone(),
            stage_name: self.job.stage.clone(),
            status,
            exit_code,
            output: transcript,
            error,
            duration: start.elapsed(),
            artifacts,
            coverage,
        };
        emit(
            &self.progress,
            ExecutionEvent::JobCompleted {
                result: result.clone(),
            },
        );
        result
    }
}

async fn wait_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped; cancellation can no longer fire.
            std::future::pending::<()>().await;
        }
    }
}

fn append_transcript(transcript: &mut String, command: &str, stdout: &str, stderr: &str) {
    transcript.push_str("$ ");
    transcript.push_str(command);
    transcript.push('\n');
    if !stdout.is_empty() {
        transcript.push_str(stdout);
        transcript.push('\n');
    }
    if !stderr.is_empty() {
        transcript.push_str(stderr);
        transcript.push('\n');
    }
}

fn emit(progress: &Option<ProgressSender>, event: ExecutionEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::{ArtifactPolicy, ArtifactsConfig, CoverageConfig, TriggerKind};
    use std::time::Duration;
    use tempfile::TempDir;

    fn stage_order() -> Vec<String> {
        vec!["build".to_string(), "test".to_string(), "report".to_string()]
    }

    fn job(name: &str, stage_index: usize, deps: &[&str], script: &[&str]) -> Job {
        Job {
            name: name.to_string(),
            kind: JobKind::BinaryOverlay,
            stage: stage_order()[stage_index].clone(),
            stage_index,
            image: None,
            before_script: vec![],
            script: script.iter().map(|s| s.to_string()).collect(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            artifacts: ArtifactsConfig::default(),
            only: None,
            timeout: None,
            coverage: None,
        }
    }

    fn with_artifacts(mut job: Job, paths: &[&str], when: ArtifactPolicy) -> Job {
        job.artifacts = ArtifactsConfig {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            when,
        };
        job
    }

    async fn run(context: RunContext, jobs: Vec<Job>) -> PipelineResult {
        let plan = ExecutionPlan::build(&stage_order(), &jobs).unwrap();
        let executor = PipelineExecutor::new(context);
        executor.execute("test-pipeline", &jobs, &plan, None).await
    }

    fn status_of(result: &PipelineResult, name: &str) -> JobStatus {
        result
            .jobs()
            .find(|j| j.job_name == name)
            .map(|j| j.status)
            .unwrap()
    }

    #[tokio::test]
    async fn test_artifacts_flow_between_stages() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        let jobs = vec![
            with_artifacts(
                job("build", 0, &[], &["echo payload > out.txt"]),
                &["out.txt"],
                ArtifactPolicy::OnSuccess,
            ),
            job("test", 1, &["build"], &["grep payload out.txt"]),
        ];

        let result = run(context, jobs).await;
        assert!(result.success());
        assert_eq!(status_of(&result, "build"), JobStatus::Succeeded);
        assert_eq!(status_of(&result, "test"), JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_failure_blocks_transitive_dependents() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());
        let store = ArtifactStore::new(context.artifact_root());

        let jobs = vec![
            job("broken", 0, &[], &["exit 1"]),
            job("healthy", 0, &[], &["true"]),
            with_artifacts(
                job("test", 1, &["broken"], &["echo never > x.txt"]),
                &["x.txt"],
                ArtifactPolicy::Always,
            ),
            job("report", 2, &["test"], &["true"]),
        ];

        let result = run(context, jobs).await;
        assert!(!result.success());
        assert_eq!(status_of(&result, "broken"), JobStatus::Failed);
        assert_eq!(status_of(&result, "healthy"), JobStatus::Succeeded);
        assert_eq!(status_of(&result, "test"), JobStatus::Blocked);
        assert_eq!(status_of(&result, "report"), JobStatus::Blocked);
        // Blocked jobs never produce artifacts, not even a log.
        assert!(!store.has_artifacts("test"));
        assert!(!store.has_artifacts("report"));
    }

    #[tokio::test]
    async fn test_trigger_predicate_skips_without_failing() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path()).with_trigger(TriggerKind::Push);

        let mut scheduled_only = job("nightly", 0, &[], &["exit 1"]);
        scheduled_only.only = Some(vec![TriggerKind::Schedule]);
        // Depends on a skipped producer: runs anyway, artifacts just absent.
        let consumer = job("consumer", 1, &["nightly"], &["true"]);

        let result = run(context, vec![scheduled_only, consumer]).await;
        assert!(result.success());
        assert_eq!(status_of(&result, "nightly"), JobStatus::Skipped);
        assert_eq!(status_of(&result, "consumer"), JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_dependency_terminal_before_dependent_starts() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        // The producer finishes writing before the consumer starts; if the
        // stage barrier or dependency ordering were broken the grep races
        // and fails.
        let jobs = vec![
            with_artifacts(
                job(
                    "slow-producer",
                    0,
                    &[],
                    &["sleep 0.3", "echo done > marker.txt"],
                ),
                &["marker.txt"],
                ArtifactPolicy::OnSuccess,
            ),
            job("consumer", 1, &["slow-producer"], &["grep done marker.txt"]),
        ];

        let result = run(context, jobs).await;
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_job_timeout_fails_job() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        let mut slow = job("slow", 0, &[], &["sleep 5"]);
        slow.timeout = Some(Duration::from_millis(200));

        let result = run(context, vec![slow]).await;
        assert!(!result.success());
        assert_eq!(status_of(&result, "slow"), JobStatus::Failed);
        let job_result = result.jobs().next().unwrap();
        assert!(job_result.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancellation_terminates_run() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        let jobs = vec![job("sleeper", 0, &[], &["sleep 5"]), job("next", 1, &["sleeper"], &["true"])];
        let plan = ExecutionPlan::build(&stage_order(), &jobs).unwrap();
        let executor = PipelineExecutor::new(context);
        let handle = executor.cancel_handle();

        let cancel_task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        });

        let result = executor.execute("test-pipeline", &jobs, &plan, None).await;
        cancel_task.await.unwrap();

        assert!(!result.success());
        assert_eq!(status_of(&result, "sleeper"), JobStatus::Canceled);
        // Once cancelled, later jobs never start.
        assert_eq!(status_of(&result, "next"), JobStatus::Canceled);
    }

    #[tokio::test]
    async fn test_execution_order_is_deterministic() {
        for _ in 0..2 {
            let dir = TempDir::new().unwrap();
            let context = RunContext::new("1", dir.path());
            let jobs = vec![
                job("build-a", 0, &[], &["true"]),
                job("build-b", 0, &[], &["true"]),
                job("test-a", 1, &["build-a", "build-b"], &["true"]),
            ];
            let result = run(context, jobs).await;

            let order: Vec<_> = result.jobs().map(|j| j.job_name.clone()).collect();
            assert_eq!(order, vec!["build-a", "build-b", "test-a"]);
        }
    }

    #[tokio::test]
    async fn test_report_job_aggregates_coverage() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        // One 4/5 trace and one 5/5 trace: combined total is 9/10 = 90%,
        // recomputed from line counts.
        let unit = with_artifacts(
            job(
                "test-unit",
                1,
                &[],
                &["printf 'SF:a.cpp\\nDA:1,1\\nDA:2,1\\nDA:3,1\\nDA:4,1\\nDA:5,0\\nend_of_record\\n' > .coverage.test-unit"],
            ),
            &[".coverage.*"],
            ArtifactPolicy::Always,
        );
        let launch = with_artifacts(
            job(
                "test-launch",
                1,
                &[],
                &["printf 'SF:b.cpp\\nDA:1,1\\nDA:2,1\\nDA:3,1\\nDA:4,1\\nDA:5,1\\nend_of_record\\n' > .coverage.test-launch"],
            ),
            &[".coverage.*"],
            ArtifactPolicy::Always,
        );
        let mut report = job("coverage", 2, &["test-unit", "test-launch"], &[]);
        report.kind = JobKind::Report;
        report.coverage = Some(CoverageConfig {
            inputs: ".coverage.*".to_string(),
            threshold: 95.0,
            html_dir: "htmlcov".to_string(),
        });

        let result = run(context, vec![unit, launch, report]).await;
        assert!(result.success());

        let report_result = result.jobs().find(|j| j.job_name == "coverage").unwrap();
        assert_eq!(report_result.status, JobStatus::Succeeded);
        let coverage = report_result.coverage.as_ref().unwrap();
        assert_eq!(coverage.total_lines, 10);
        assert_eq!(coverage.covered_lines, 9);
        assert!((coverage.percent - 90.0).abs() < f64::EPSILON);
        // Below the 95% threshold, but only as an advisory flag.
        assert!(coverage.below_threshold);
    }

    struct PanickingRunner;

    #[async_trait::async_trait]
    impl CommandRunner for PanickingRunner {
        async fn run(
            &self,
            _command: &str,
            _env: &HashMap<String, String>,
            _workspace: &std::path::Path,
        ) -> crate::runners::CommandOutput {
            panic!("runner blew up");
        }
    }

    #[tokio::test]
    async fn test_panicked_job_fails_under_its_own_name_and_blocks_dependents() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());

        let jobs = vec![
            job("build", 0, &[], &["true"]),
            job("test", 1, &["build"], &["true"]),
        ];
        let plan = ExecutionPlan::build(&stage_order(), &jobs).unwrap();
        let executor = PipelineExecutor::with_runner(context, Arc::new(PanickingRunner));
        let result = executor.execute("test-pipeline", &jobs, &plan, None).await;

        assert!(!result.success());
        assert_eq!(status_of(&result, "build"), JobStatus::Failed);
        assert_eq!(status_of(&result, "test"), JobStatus::Blocked);
    }

    #[tokio::test]
    async fn test_logs_retained_for_failed_jobs() {
        let dir = TempDir::new().unwrap();
        let context = RunContext::new("1", dir.path());
        let store = ArtifactStore::new(context.artifact_root());

        let jobs = vec![job("noisy", 0, &[], &["echo diagnostic output", "exit 1"])];
        let result = run(context, jobs).await;

        assert_eq!(status_of(&result, "noisy"), JobStatus::Failed);
        let log = std::fs::read_to_string(dir.path().join("artifacts/noisy/job.log")).unwrap();
        assert!(log.contains("diagnostic output"));
        // The log alone is not an artifact set.
        assert!(!store.has_artifacts("noisy"));
    }
}
