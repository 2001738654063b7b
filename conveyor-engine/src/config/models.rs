// Pipeline configuration model
// Raw types deserialized from the pipeline YAML file, plus the effective
// (template-merged) job definitions the executor consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A full pipeline definition as written in the YAML file.
///
/// Jobs and templates live in ordered maps so that repeated parses of the
/// same file always produce the same iteration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: Option<String>,
    /// Ordered stage names. Jobs in stage N+1 only start once every job in
    /// stage N is terminal.
    pub stages: Vec<String>,
    #[serde(default)]
    pub templates: BTreeMap<String, JobTemplate>,
    #[serde(deserialize_with = "jobs_without_duplicates")]
    pub jobs: BTreeMap<String, JobConfig>,
}

/// YAML allows repeated mapping keys, and a plain map deserialization
/// would silently keep the last definition. Two jobs with the same name
/// is a configuration mistake; reject it.
fn jobs_without_duplicates<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, JobConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct JobsVisitor;

    impl<'de> serde::de::Visitor<'de> for JobsVisitor {
        type Value = BTreeMap<String, JobConfig>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a map of job name to job definition")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut jobs = BTreeMap::new();
            while let Some((name, job)) = access.next_entry::<String, JobConfig>()? {
                if jobs.insert(name.clone(), job).is_some() {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate job definition '{}'",
                        name
                    )));
                }
            }
            Ok(jobs)
        }
    }

    deserializer.deserialize_map(JobsVisitor)
}

/// A reusable job fragment. Templates are never executed directly; a job
/// references one via `extends` and the two are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTemplate {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_script: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<String>,
}

/// One job as written in the YAML file, before template merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub kind: JobKind,
    pub stage: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// `None` means "not declared" and is distinct from an empty list:
    /// an undeclared list inherits from the template.
    #[serde(default)]
    pub before_script: Option<Vec<String>>,
    #[serde(default)]
    pub script: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub artifacts: Option<ArtifactsConfig>,
    /// Trigger predicate: the job runs only when the pipeline trigger is one
    /// of the listed kinds. Absent means "run on every trigger".
    #[serde(default)]
    pub only: Option<Vec<TriggerKind>>,
    /// Per-job timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub coverage: Option<CoverageConfig>,
}

/// Job variant tag. All kinds share the same surface (stage, dependencies,
/// script execution); `report` additionally drives coverage aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Build against pre-installed binary packages.
    #[default]
    BinaryOverlay,
    /// Build upstream dependencies from source first.
    SourceBuild,
    /// Reporting job (coverage aggregation).
    Report,
}

/// Declared artifact outputs of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    pub paths: Vec<String>,
    #[serde(default)]
    pub when: ArtifactPolicy,
}

/// Artifact retention policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPolicy {
    /// Capture declared paths only when the job succeeded.
    #[default]
    OnSuccess,
    /// Capture declared paths regardless of the job outcome.
    Always,
}

/// What caused the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Push,
    Schedule,
    Manual,
}

/// Coverage aggregation settings for a report job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Glob matching the per-job coverage trace files to merge,
    /// relative to the job workspace (e.g. `.coverage.*`).
    pub inputs: String,
    /// Advisory reporting threshold in percent. A total below this is
    /// logged and surfaced in the report but never fails the job.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Directory (relative to the workspace) receiving the HTML export.
    #[serde(default = "default_html_dir")]
    pub html_dir: String,
}

fn default_threshold() -> f64 {
    80.0
}

fn default_html_dir() -> String {
    "htmlcov".to_string()
}

/// A job after template merging and validation. This is what the executor
/// schedules.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub kind: JobKind,
    pub stage: String,
    /// Index of `stage` in the pipeline's declared stage order.
    pub stage_index: usize,
    pub image: Option<String>,
    pub before_script: Vec<String>,
    pub script: Vec<String>,
    pub dependencies: Vec<String>,
    pub artifacts: ArtifactsConfig,
    pub only: Option<Vec<TriggerKind>>,
    pub timeout: Option<Duration>,
    pub coverage: Option<CoverageConfig>,
}

impl Job {
    /// All commands the job runs, setup first.
    pub fn commands(&self) -> impl Iterator<Item = &String> {
        self.before_script.iter().chain(self.script.iter())
    }
}
