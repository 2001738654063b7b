// Run context
// Immutable description of one pipeline run: what triggered it, which
// commit and branch it is for, and where on disk it executes. Threaded
// into trigger-predicate evaluation and artifact-path resolution instead
// of reading ambient runner state.

use crate::config::models::{Job, TriggerKind};

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunContext {
    /// What caused this run.
    pub trigger: TriggerKind,
    /// Commit under test, if known.
    pub commit: Option<String>,
    /// Branch under test, if known.
    pub branch: Option<String>,
    /// Identifier for this run; namespaces the artifact store.
    pub pipeline_id: String,
    /// Root directory for job workspaces and the artifact store.
    pub workspace_root: PathBuf,
}

impl RunContext {
    pub fn new(pipeline_id: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            trigger: TriggerKind::Push,
            commit: None,
            branch: None,
            pipeline_id: pipeline_id.into(),
            workspace_root: workspace_root.into(),
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Evaluate a job's trigger predicate against this run.
    ///
    /// A job with no `only` clause runs on every trigger; otherwise it runs
    /// only when the run's trigger kind is listed.
    pub fn job_allowed(&self, job: &Job) -> bool {
        match &job.only {
            None => true,
            Some(kinds) => kinds.contains(&self.trigger),
        }
    }

    /// Workspace directory for one job.
    pub fn job_workspace(&self, job_name: &str) -> PathBuf {
        self.workspace_root.join("jobs").join(job_name)
    }

    /// Root of the artifact store for this run.
    pub fn artifact_root(&self) -> PathBuf {
        self.workspace_root.join("artifacts")
    }

    /// Environment injected into every job process.
    pub fn base_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("CI".to_string(), "true".to_string()),
            ("CI_PIPELINE_ID".to_string(), self.pipeline_id.clone()),
            (
                "CI_TRIGGER".to_string(),
                trigger_name(self.trigger).to_string(),
            ),
        ];
        if let Some(commit) = &self.commit {
            env.push(("CI_COMMIT_SHA".to_string(), commit.clone()));
        }
        if let Some(branch) = &self.branch {
            env.push(("CI_COMMIT_BRANCH".to_string(), branch.clone()));
        }
        env
    }
}

fn trigger_name(trigger: TriggerKind) -> &'static str {
    match trigger {
        TriggerKind::Push => "push",
        TriggerKind::Schedule => "schedule",
        TriggerKind::Manual => "manual",
    }
}

impl AsRef<Path> for RunContext {
    fn as_ref(&self) -> &Path {
        &self.workspace_root
    }
}
