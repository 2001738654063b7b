// `conveyor validate`
// Parse, resolve templates, and validate the job graph without running
// anything.

use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use conveyor_engine::{resolve_jobs, ExecutionPlan, PipelineParser};

/// Parse a pipeline file, resolve templates, and validate the job graph
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the pipeline YAML file
    pub pipeline: PathBuf,

    /// Print the resolved jobs in execution order
    #[arg(long)]
    pub plan: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let pipeline_path = &args.pipeline;
    if !pipeline_path.exists() {
        color_eyre::eyre::bail!("Pipeline file not found: {}", pipeline_path.display());
    }

    output::status("Validating", &format!("{}", pipeline_path.display()));

    let config = match PipelineParser::from_file(pipeline_path) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("{}", e));
            std::process::exit(1);
        }
    };
    output::check("YAML syntax valid");
    output::check(&format!(
        "Structure: {} stages, {} templates, {} jobs",
        config.stages.len(),
        config.templates.len(),
        config.jobs.len()
    ));

    let jobs = match resolve_jobs(&config) {
        Ok(jobs) => jobs,
        Err(e) => {
            output::error(&format!("{}", e));
            std::process::exit(1);
        }
    };
    output::check("Templates resolved");

    let plan = match ExecutionPlan::build(&config.stages, &jobs) {
        Ok(plan) => plan,
        Err(e) => {
            output::error(&format!("{}", e));
            std::process::exit(1);
        }
    };
    output::check("Job graph valid");

    if args.plan {
        println!();
        for stage in &plan.stages {
            println!("stage {}", stage.name);
            for &index in &stage.jobs {
                let job = &jobs[index];
                let deps = if job.dependencies.is_empty() {
                    String::new()
                } else {
                    format!("  (needs {})", job.dependencies.join(", "))
                };
                println!("  {}{}", job.name, deps);
            }
        }
    }

    output::status("Valid", &format!("{}", pipeline_path.display()));
    Ok(())
}
