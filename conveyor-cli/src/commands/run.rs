// `conveyor run`
// Load a pipeline, execute it, and render progress events as they arrive.

use crate::output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use color_eyre::Result;

use conveyor_engine::execution::events::progress_channel;
use conveyor_engine::{load_pipeline, ExecutionEvent, PipelineExecutor, RunContext, TriggerKind};

/// Execute a pipeline
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the pipeline YAML file
    pub pipeline: PathBuf,

    /// What triggered this run (push, schedule, manual)
    #[arg(long, default_value = "push", value_parser = parse_trigger)]
    pub trigger: TriggerKind,

    /// Commit SHA exposed to jobs as CI_COMMIT_SHA
    #[arg(long, value_name = "SHA")]
    pub commit: Option<String>,

    /// Branch name exposed to jobs as CI_COMMIT_BRANCH
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Identifier for this run (default: derived from the current time)
    #[arg(long, value_name = "ID")]
    pub pipeline_id: Option<String>,

    /// Root directory for job workspaces and artifacts
    #[arg(long, short = 'w', value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

fn parse_trigger(s: &str) -> Result<TriggerKind, String> {
    match s {
        "push" => Ok(TriggerKind::Push),
        "schedule" => Ok(TriggerKind::Schedule),
        "manual" => Ok(TriggerKind::Manual),
        other => Err(format!(
            "unknown trigger '{}', expected push, schedule, or manual",
            other
        )),
    }
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let pipeline_path = &args.pipeline;
    if !pipeline_path.exists() {
        color_eyre::eyre::bail!("Pipeline file not found: {}", pipeline_path.display());
    }

    output::status("Loading", &format!("{}", pipeline_path.display()));
    let loaded = load_pipeline(pipeline_path)?;
    let pipeline_name = loaded.name().to_string();

    output::info(&format!(
        "Pipeline '{}': {} stages, {} jobs",
        pipeline_name,
        loaded.plan.stages.len(),
        loaded.jobs.len()
    ));

    let workspace = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?.join(".conveyor"),
    };
    let pipeline_id = args.pipeline_id.clone().unwrap_or_else(|| {
        format!(
            "{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        )
    });

    let mut context = RunContext::new(pipeline_id, workspace).with_trigger(args.trigger);
    if let Some(commit) = &args.commit {
        context = context.with_commit(commit.clone());
    }
    if let Some(branch) = &args.branch {
        context = context.with_branch(branch.clone());
    }

    let (tx, mut rx) = progress_channel();
    let executor = Arc::new(PipelineExecutor::new(context));

    let exec_handle = {
        let executor = executor.clone();
        let jobs = loaded.jobs.clone();
        let plan = loaded.plan.clone();
        let name = pipeline_name.clone();
        tokio::spawn(async move { executor.execute(&name, &jobs, &plan, Some(tx)).await })
    };

    // Cancel the run on Ctrl-C; a second Ctrl-C kills the process.
    {
        let handle = executor.cancel_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!();
                output::warning("Interrupt received, cancelling run");
                handle.cancel();
            }
        });
    }

    while let Some(event) = rx.recv().await {
        match &event {
            ExecutionEvent::PipelineStarted { name, pipeline_id } => {
                println!();
                output::header(&format!("Pipeline '{}' (run {})", name, pipeline_id));
            }

            ExecutionEvent::StageStarted {
                stage_name,
                stage_index,
            } => {
                let total = loaded.plan.stages[*stage_index].jobs.len();
                output::stage_started(stage_name, total);
            }

            ExecutionEvent::JobStarted { job_name, .. } => {
                output::job_started(job_name);
            }

            ExecutionEvent::JobOutput { line, .. } => {
                output::job_line(line);
            }

            ExecutionEvent::ArtifactMissing { job_name, pattern } => {
                output::warning(&format!(
                    "    Job '{}': no artifacts matched '{}'",
                    job_name, pattern
                ));
            }

            ExecutionEvent::JobCompleted { result } => {
                output::job_completed(result);
            }

            ExecutionEvent::StageCompleted { result, .. } => {
                output::stage_completed(result);
            }

            ExecutionEvent::PipelineCompleted {
                success,
                failed_jobs,
                skipped_jobs,
                blocked_jobs,
            } => {
                output::pipeline_completed(*success, *failed_jobs, *skipped_jobs, *blocked_jobs);
            }
        }
    }

    let result = exec_handle.await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.summary());
    }

    if !result.success() {
        std::process::exit(1);
    }

    Ok(())
}
