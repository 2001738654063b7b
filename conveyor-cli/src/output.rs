// Terminal rendering for pipeline runs
// Progress and diagnostics go to stderr; stdout is reserved for job output
// lines and the machine-readable summary.

use conveyor_engine::execution::StageResult;
use conveyor_engine::{CoverageReport, JobResult, JobStatus};

/// Print a status line: right-aligned bold verb, then the message.
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>12}\x1b[0m {}", action, message);
}

/// Print a passed validation step
pub fn check(message: &str) {
    eprintln!("\x1b[32m  \u{2713}\x1b[0m {}", message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("\x1b[33m  !\x1b[0m {}", message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("\x1b[1;31merror:\x1b[0m {}", message);
}

/// Print an info message
pub fn info(message: &str) {
    eprintln!("\x1b[36m  i\x1b[0m {}", message);
}

/// Print a run header line
pub fn header(message: &str) {
    eprintln!("\x1b[1m==> {}\x1b[0m", message);
}

/// A line of job output, indented under the job entry. Stdout, so it can
/// be piped separately from the progress rendering.
pub fn job_line(line: &str) {
    println!("      | {}", line);
}

pub fn stage_started(stage_name: &str, total_jobs: usize) {
    eprintln!("\x1b[1;34m  Stage\x1b[0m '{}' ({} jobs)", stage_name, total_jobs);
}

pub fn stage_completed(result: &StageResult) {
    let color = if result.failed() { "\x1b[31m" } else { "\x1b[32m" };
    eprintln!(
        "{}  Stage '{}' {} ({:.2}s)\x1b[0m",
        color,
        result.stage_name,
        if result.failed() { "FAIL" } else { "OK" },
        result.duration.as_secs_f64()
    );
}

pub fn job_started(job_name: &str) {
    eprintln!("    Job '{}'", job_name);
}

/// One completed job: status line, error if any, coverage note if any.
pub fn job_completed(result: &JobResult) {
    let color = match result.status {
        JobStatus::Succeeded => "\x1b[32m",
        JobStatus::Failed | JobStatus::Canceled => "\x1b[31m",
        _ => "\x1b[33m",
    };
    eprintln!(
        "{}    Job '{}' {} ({:.2}s)\x1b[0m",
        color,
        result.job_name,
        status_symbol(result.status),
        result.duration.as_secs_f64()
    );
    if let Some(err) = &result.error {
        error(&format!("    {}", err));
    }
    if let Some(coverage) = &result.coverage {
        coverage_note(coverage);
    }
}

fn coverage_note(report: &CoverageReport) {
    let note = format!(
        "    coverage: {:.1}% ({}/{} lines)",
        report.percent, report.covered_lines, report.total_lines
    );
    if report.below_threshold {
        warning(&format!(
            "{}, below {:.0}% threshold",
            note, report.threshold
        ));
    } else {
        info(&note);
    }
}

pub fn pipeline_completed(success: bool, failed: usize, skipped: usize, blocked: usize) {
    eprintln!();
    let counts = format!("{} failed, {} skipped, {} blocked", failed, skipped, blocked);
    if success {
        eprintln!("\x1b[1;32m  \u{2713}\x1b[0m Pipeline succeeded ({})", counts);
    } else {
        eprintln!("\x1b[1;31m  \u{2717}\x1b[0m Pipeline failed ({})", counts);
    }
}

pub fn status_symbol(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Succeeded => "OK",
        JobStatus::Failed => "FAIL",
        JobStatus::Skipped => "SKIP",
        JobStatus::Blocked => "BLOCKED",
        JobStatus::Canceled => "CANCELED",
        JobStatus::Pending | JobStatus::Running => "...",
    }
}
