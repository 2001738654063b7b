// Artifact store
// Captures a job's declared output paths into a per-run store keyed by job
// name, and materializes dependency artifacts into downstream workspaces.
//
// Store layout per job: declared artifacts under `<job>/files/`, the run
// log at `<job>/job.log`. Only `files/` is ever materialized, so logs
// never leak into dependents' workspaces or collide across producers.

use crate::config::models::{ArtifactPolicy, ArtifactsConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("failed to copy '{path}': {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed artifact store for one pipeline run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn job_dir(&self, job_name: &str) -> PathBuf {
        self.root.join(job_name)
    }

    fn files_dir(&self, job_name: &str) -> PathBuf {
        self.job_dir(job_name).join("files")
    }

    /// Capture a job's declared artifacts out of its workspace.
    ///
    /// Returns the store-relative paths that were captured. Patterns that
    /// match nothing are a soft warning, never an error: the underlying
    /// build tool may legitimately produce no output for a pattern. The
    /// caller reports them via `on_missing`.
    pub fn capture(
        &self,
        job_name: &str,
        workspace: &Path,
        rule: &ArtifactsConfig,
        succeeded: bool,
        mut on_missing: impl FnMut(&str),
    ) -> Result<Vec<PathBuf>, ArtifactError> {
        if rule.paths.is_empty() {
            return Ok(Vec::new());
        }
        if rule.when == ArtifactPolicy::OnSuccess && !succeeded {
            debug!(job = job_name, "skipping artifact capture for failed job");
            return Ok(Vec::new());
        }

        // Created lazily by the first copy, so a capture where every
        // pattern missed leaves no artifact set behind.
        let dest_root = self.files_dir(job_name);

        let mut captured = Vec::new();
        for pattern in &rule.paths {
            // Trailing slash denotes a directory artifact.
            let trimmed = pattern.trim_end_matches('/');
            let full_pattern = workspace.join(trimmed);
            let matches =
                glob::glob(&full_pattern.to_string_lossy()).map_err(|e| ArtifactError::Pattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;

            let mut matched_any = false;
            for entry in matches.flatten() {
                matched_any = true;
                let relative = entry
                    .strip_prefix(workspace)
                    .unwrap_or(&entry)
                    .to_path_buf();
                let dest = dest_root.join(&relative);
                copy_recursive(&entry, &dest)?;
                captured.push(relative);
            }

            if !matched_any {
                warn!(
                    job = job_name,
                    pattern = pattern.as_str(),
                    "declared artifact pattern matched nothing"
                );
                on_missing(pattern);
            }
        }

        Ok(captured)
    }

    /// Store a job's raw log. Logs are retained regardless of outcome.
    pub fn store_log(&self, job_name: &str, contents: &str) -> Result<PathBuf, ArtifactError> {
        let dir = self.job_dir(job_name);
        fs::create_dir_all(&dir)?;
        let path = dir.join("job.log");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Copy the artifact sets of `producers` into `workspace`.
    ///
    /// A producer with no artifact set (skipped job, or nothing captured)
    /// is a soft warning reported via `on_missing`.
    pub fn materialize(
        &self,
        producers: &[String],
        workspace: &Path,
        mut on_missing: impl FnMut(&str),
    ) -> Result<(), ArtifactError> {
        fs::create_dir_all(workspace)?;
        for producer in producers {
            let src = self.files_dir(producer);
            if !src.exists() {
                warn!(
                    producer = producer.as_str(),
                    "no artifact set to materialize"
                );
                on_missing(producer);
                continue;
            }
            copy_dir_contents(&src, workspace)?;
        }
        Ok(())
    }

    /// Whether a job has a captured artifact set. Logs do not count.
    pub fn has_artifacts(&self, job_name: &str) -> bool {
        self.files_dir(job_name).exists()
    }
}

fn copy_recursive(src: &Path, dest: &Path) -> Result<(), ArtifactError> {
    if src.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest).map_err(|e| ArtifactError::Copy {
            path: src.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn copy_dir_contents(src: &Path, dest: &Path) -> Result<(), ArtifactError> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
    }
    Ok(())
}
