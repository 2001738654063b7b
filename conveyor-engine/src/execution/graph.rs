// Execution plan
// Partitions effective jobs into the declared stage order and validates the
// dependency structure before anything runs. Dependencies may only point at
// jobs in a strictly earlier stage, which also rules out cycles.

use crate::config::models::Job;

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },

    #[error(
        "job '{job}' (stage '{stage}') depends on '{dependency}' in the same stage; \
         dependencies must reference an earlier stage"
    )]
    IntraStageDependency {
        job: String,
        dependency: String,
        stage: String,
    },

    #[error(
        "job '{job}' (stage '{stage}') depends on '{dependency}' in later stage \
         '{dependency_stage}'; dependencies must reference an earlier stage"
    )]
    BackwardDependency {
        job: String,
        dependency: String,
        stage: String,
        dependency_stage: String,
    },

    #[error("job '{job}' depends on itself")]
    SelfDependency { job: String },
}

/// One stage's slice of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    pub name: String,
    /// Indices into the job list, in deterministic scheduling order.
    pub jobs: Vec<usize>,
}

/// Validated execution plan for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub stages: Vec<StagePlan>,
    /// Reverse dependency edges: producer name -> names of direct consumers.
    dependents: HashMap<String, Vec<String>>,
}

impl ExecutionPlan {
    /// Build and validate a plan from resolved jobs.
    ///
    /// `stage_order` is the pipeline's declared stage list; `jobs` is the
    /// output of template resolution (already sorted by stage, then name).
    pub fn build(stage_order: &[String], jobs: &[Job]) -> Result<Self, ValidationError> {
        let index_by_name: HashMap<&str, usize> = jobs
            .iter()
            .enumerate()
            .map(|(i, j)| (j.name.as_str(), i))
            .collect();

        for job in jobs {
            for dep in &job.dependencies {
                if dep == &job.name {
                    return Err(ValidationError::SelfDependency {
                        job: job.name.clone(),
                    });
                }
                let dep_idx = *index_by_name.get(dep.as_str()).ok_or_else(|| {
                    ValidationError::UnknownDependency {
                        job: job.name.clone(),
                        dependency: dep.clone(),
                    }
                })?;
                let dep_job = &jobs[dep_idx];
                if dep_job.stage_index == job.stage_index {
                    return Err(ValidationError::IntraStageDependency {
                        job: job.name.clone(),
                        dependency: dep.clone(),
                        stage: job.stage.clone(),
                    });
                }
                if dep_job.stage_index > job.stage_index {
                    return Err(ValidationError::BackwardDependency {
                        job: job.name.clone(),
                        dependency: dep.clone(),
                        stage: job.stage.clone(),
                        dependency_stage: dep_job.stage.clone(),
                    });
                }
            }
        }

        let mut stages: Vec<StagePlan> = stage_order
            .iter()
            .map(|name| StagePlan {
                name: name.clone(),
                jobs: Vec::new(),
            })
            .collect();

        for (i, job) in jobs.iter().enumerate() {
            stages[job.stage_index].jobs.push(i);
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for job in jobs {
            for dep in &job.dependencies {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(job.name.clone());
            }
        }

        Ok(Self { stages, dependents })
    }

    /// Every job reachable downstream of `name` through dependency edges.
    pub fn transitive_dependents(&self, name: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let mut queue: Vec<&str> = vec![name];
        while let Some(current) = queue.pop() {
            if let Some(children) = self.dependents.get(current) {
                for child in children {
                    if result.insert(child.clone()) {
                        queue.push(child.as_str());
                    }
                }
            }
        }
        result
    }
}
