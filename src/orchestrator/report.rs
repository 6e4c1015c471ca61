//! Run results and exit statuses

#![allow(clippy::must_use_candidate)]

use super::job::JobState;
use super::post::PostStepKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every build and post step succeeded
pub const EXIT_SUCCESS: i32 = 0;
/// At least one build or post step failed
pub const EXIT_FAILURE: i32 = 1;
/// Bad configuration, unusable target list or filesystem error
pub const EXIT_USAGE: i32 = 2;
/// The operator interrupted the run
pub const EXIT_INTERRUPTED: i32 = 130;

/// Outcome of one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Image name
    pub name: String,
    /// Base image
    pub distro: String,
    /// Build-context directory
    pub context_dir: PathBuf,
    /// Final state, `Succeeded` or `Failed`
    pub state: JobState,
    /// Exit code of the build command
    pub exit_code: i32,
    /// Why the build command could not run, if it did not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    /// Returns true if the build succeeded
    pub fn is_success(&self) -> bool {
        self.state == JobState::Succeeded
    }
}

/// Outcome of one post step for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStepResult {
    /// Which step
    pub step: PostStepKind,
    /// Image the step ran for
    pub image: String,
    /// Exit code of the last command of the step
    pub exit_code: i32,
    /// Why a command could not run, if it did not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostStepResult {
    /// Returns true if the step succeeded
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }
}

/// Aggregate result of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Builds, in target order
    pub jobs: Vec<JobResult>,
    /// Post steps, in execution order; empty unless every build succeeded
    pub post_steps: Vec<PostStepResult>,
}

impl RunReport {
    /// Returns true if every build succeeded
    pub fn builds_succeeded(&self) -> bool {
        self.jobs.iter().all(JobResult::is_success)
    }

    /// Returns true if every build and post step succeeded
    pub fn is_success(&self) -> bool {
        self.builds_succeeded() && self.post_steps.iter().all(PostStepResult::is_success)
    }

    /// Builds that failed
    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobResult> {
        self.jobs.iter().filter(|j| !j.is_success())
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Exit codes of all builds, in target order
    pub fn exit_codes(&self) -> Vec<i32> {
        self.jobs.iter().map(|j| j.exit_code).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, code: i32) -> JobResult {
        JobResult {
            name: name.to_string(),
            distro: "debian:9".to_string(),
            context_dir: PathBuf::from(name),
            state: if code == 0 {
                JobState::Succeeded
            } else {
                JobState::Failed
            },
            exit_code: code,
            error: None,
        }
    }

    #[test]
    fn test_empty_report_succeeds() {
        let report = RunReport::default();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_failed_build_fails_report() {
        let report = RunReport {
            jobs: vec![job("a", 0), job("b", 2)],
            post_steps: Vec::new(),
        };
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), EXIT_FAILURE);
        assert_eq!(report.exit_codes(), vec![0, 2]);
        let failed: Vec<&str> = report.failed_jobs().map(|j| j.name.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
    }

    #[test]
    fn test_failed_post_step_fails_report() {
        let report = RunReport {
            jobs: vec![job("a", 0)],
            post_steps: vec![PostStepResult {
                step: PostStepKind::Publish,
                image: "a".to_string(),
                exit_code: 1,
                error: None,
            }],
        };
        assert!(report.builds_succeeded());
        assert_eq!(report.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport {
            jobs: vec![job("a", 0)],
            post_steps: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["jobs"][0]["state"], "succeeded");
        assert!(json["jobs"][0].get("error").is_none());
    }

    #[test]
    fn test_interrupted_is_distinct() {
        assert_ne!(EXIT_INTERRUPTED, EXIT_FAILURE);
        assert_ne!(EXIT_INTERRUPTED, EXIT_USAGE);
    }
}
