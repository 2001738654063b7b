// Template merge engine
// Resolves `extends` references into effective job definitions.
//
// Merge semantics, chosen once and relied on throughout:
//   - scalar fields (`image`): the job overrides the template when present.
//   - `before_script`: concatenated template-first. Setup commands from the
//     template run before the job's own setup commands.
//   - `script`: the job fully redefines. A job that declares `script`
//     replaces the template's; a job without one inherits it.

use crate::config::models::{ArtifactsConfig, Job, JobConfig, JobKind, JobTemplate, PipelineConfig};
use crate::config::ConfigError;

use std::time::Duration;

/// Resolve all template references in a pipeline, producing effective jobs.
///
/// Jobs come back ordered by (stage index, declaration-map order), which is
/// the deterministic order the executor schedules them in. Referencing an
/// unknown template or an unknown stage is reported here, before anything
/// runs.
pub fn resolve_jobs(config: &PipelineConfig) -> Result<Vec<Job>, ConfigError> {
    let mut jobs = Vec::with_capacity(config.jobs.len());

    for (name, job_config) in &config.jobs {
        let stage_index = config
            .stages
            .iter()
            .position(|s| s == &job_config.stage)
            .ok_or_else(|| ConfigError::UnknownStage {
                job: name.clone(),
                stage: job_config.stage.clone(),
            })?;

        // Coverage settings only take effect on report jobs; anywhere else
        // they would be silently ignored at run time.
        if job_config.coverage.is_some() && job_config.kind != JobKind::Report {
            return Err(ConfigError::CoverageWithoutReportKind { job: name.clone() });
        }

        let template = match &job_config.extends {
            Some(template_ref) => Some(config.templates.get(template_ref).ok_or_else(|| {
                ConfigError::UnknownTemplate {
                    job: name.clone(),
                    template: template_ref.clone(),
                }
            })?),
            None => None,
        };

        jobs.push(merge(name, job_config, template, stage_index));
    }

    // Stage order first; BTreeMap iteration keeps within-stage order stable.
    jobs.sort_by_key(|j| j.stage_index);

    Ok(jobs)
}

/// Merge a job with its (optional) template into an effective definition.
fn merge(name: &str, job: &JobConfig, template: Option<&JobTemplate>, stage_index: usize) -> Job {
    let image = job
        .image
        .clone()
        .or_else(|| template.and_then(|t| t.image.clone()));

    let mut before_script = template.map(|t| t.before_script.clone()).unwrap_or_default();
    if let Some(own) = &job.before_script {
        before_script.extend(own.iter().cloned());
    }

    let script = match &job.script {
        Some(own) => own.clone(),
        None => template.map(|t| t.script.clone()).unwrap_or_default(),
    };

    Job {
        name: name.to_string(),
        kind: job.kind,
        stage: job.stage.clone(),
        stage_index,
        image,
        before_script,
        script,
        dependencies: job.dependencies.clone(),
        artifacts: job.artifacts.clone().unwrap_or_else(ArtifactsConfig::default),
        only: job.only.clone(),
        timeout: job.timeout.map(Duration::from_secs),
        coverage: job.coverage.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_with(template: JobTemplate, job: JobConfig) -> PipelineConfig {
        let mut templates = BTreeMap::new();
        templates.insert("base".to_string(), template);
        let mut jobs = BTreeMap::new();
        jobs.insert("job".to_string(), job);
        PipelineConfig {
            pipeline: None,
            stages: vec!["build".to_string()],
            templates,
            jobs,
        }
    }

    fn job_extending_base() -> JobConfig {
        JobConfig {
            stage: "build".to_string(),
            extends: Some("base".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_before_script_concatenates_template_first() {
        let template = JobTemplate {
            before_script: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let mut job = job_extending_base();
        job.before_script = Some(vec!["c".to_string()]);

        let jobs = resolve_jobs(&config_with(template, job)).unwrap();
        assert_eq!(jobs[0].before_script, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_script_fully_redefined_by_job() {
        let template = JobTemplate {
            script: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let mut job = job_extending_base();
        job.script = Some(vec!["c".to_string()]);

        let jobs = resolve_jobs(&config_with(template, job)).unwrap();
        assert_eq!(jobs[0].script, vec!["c"]);
    }

    #[test]
    fn test_script_inherited_when_undeclared() {
        let template = JobTemplate {
            script: vec!["a".to_string()],
            ..Default::default()
        };
        let job = job_extending_base();

        let jobs = resolve_jobs(&config_with(template, job)).unwrap();
        assert_eq!(jobs[0].script, vec!["a"]);
    }

    #[test]
    fn test_image_override() {
        let template = JobTemplate {
            image: Some("ros:humble".to_string()),
            ..Default::default()
        };
        let mut job = job_extending_base();
        job.image = Some("ros:jazzy".to_string());

        let jobs = resolve_jobs(&config_with(template, job)).unwrap();
        assert_eq!(jobs[0].image.as_deref(), Some("ros:jazzy"));
    }

    #[test]
    fn test_image_inherited() {
        let template = JobTemplate {
            image: Some("ros:humble".to_string()),
            ..Default::default()
        };
        let job = job_extending_base();

        let jobs = resolve_jobs(&config_with(template, job)).unwrap();
        assert_eq!(jobs[0].image.as_deref(), Some("ros:humble"));
    }

    #[test]
    fn test_unknown_template_is_config_error() {
        let mut job = job_extending_base();
        job.extends = Some("missing".to_string());

        let result = resolve_jobs(&config_with(JobTemplate::default(), job));
        assert!(matches!(
            result,
            Err(ConfigError::UnknownTemplate { ref template, .. }) if template == "missing"
        ));
    }

    #[test]
    fn test_coverage_on_non_report_job_is_config_error() {
        use crate::config::models::CoverageConfig;

        let mut job = job_extending_base();
        job.coverage = Some(CoverageConfig {
            inputs: ".coverage.*".to_string(),
            threshold: 80.0,
            html_dir: "htmlcov".to_string(),
        });

        let result = resolve_jobs(&config_with(JobTemplate::default(), job));
        assert!(matches!(
            result,
            Err(ConfigError::CoverageWithoutReportKind { ref job }) if job == "job"
        ));
    }

    #[test]
    fn test_coverage_on_report_job_accepted() {
        use crate::config::models::CoverageConfig;

        let mut job = job_extending_base();
        job.kind = JobKind::Report;
        job.coverage = Some(CoverageConfig {
            inputs: ".coverage.*".to_string(),
            threshold: 80.0,
            html_dir: "htmlcov".to_string(),
        });

        let jobs = resolve_jobs(&config_with(JobTemplate::default(), job)).unwrap();
        assert!(jobs[0].coverage.is_some());
    }

    #[test]
    fn test_unknown_stage_is_config_error() {
        let mut job = job_extending_base();
        job.stage = "deploy".to_string();

        let result = resolve_jobs(&config_with(JobTemplate::default(), job));
        assert!(matches!(result, Err(ConfigError::UnknownStage { .. })));
    }

    #[test]
    fn test_jobs_ordered_by_stage_then_name() {
        let mut jobs = BTreeMap::new();
        jobs.insert(
            "z-build".to_string(),
            JobConfig {
                stage: "build".to_string(),
                ..Default::default()
            },
        );
        jobs.insert(
            "a-test".to_string(),
            JobConfig {
                stage: "test".to_string(),
                ..Default::default()
            },
        );
        jobs.insert(
            "a-build".to_string(),
            JobConfig {
                stage: "build".to_string(),
                ..Default::default()
            },
        );
        let config = PipelineConfig {
            pipeline: None,
            stages: vec!["build".to_string(), "test".to_string()],
            templates: BTreeMap::new(),
            jobs,
        };

        let resolved = resolve_jobs(&config).unwrap();
        let names: Vec<_> = resolved.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["a-build", "z-build", "a-test"]);
    }
}
