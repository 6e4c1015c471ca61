//! Build jobs and their lifecycle

#![allow(clippy::must_use_candidate)]

use super::errors::OrchestratorError;
use crate::fragment::BuildTarget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle of a build job
///
/// `Pending → Generating → Generated → Building → {Succeeded, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Not started
    Pending,
    /// Writing the build context
    Generating,
    /// Build context on disk
    Generated,
    /// Build command running
    Building,
    /// Build exited 0
    Succeeded,
    /// Build exited non-zero or could not run
    Failed,
}

impl JobState {
    /// Returns true if `next` directly follows this state
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Generating)
                | (Self::Generating, Self::Generated)
                | (Self::Generated, Self::Building)
                | (Self::Building, Self::Succeeded | Self::Failed)
        )
    }

    /// Returns true for `Succeeded` and `Failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Generating => write!(f, "GENERATING"),
            Self::Generated => write!(f, "GENERATED"),
            Self::Building => write!(f, "BUILDING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A target together with its build context
#[derive(Debug, Clone)]
pub struct BuildJob {
    target: BuildTarget,
    name: String,
    context_dir: Option<PathBuf>,
    state: JobState,
}

impl BuildJob {
    /// Creates a pending job
    pub fn new(target: BuildTarget) -> Self {
        let name = target.image_name();
        Self {
            target,
            name,
            context_dir: None,
            state: JobState::Pending,
        }
    }

    /// Image name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target this job builds
    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Build-context directory, once generated
    pub fn context_dir(&self) -> Option<&Path> {
        self.context_dir.as_deref()
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Moves to `next`
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidTransition`] if `next` does not
    /// directly follow the current state.
    pub fn transition(&mut self, next: JobState) -> Result<(), OrchestratorError> {
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                name: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(job = %self.name, from = %self.state, to = %next, "Job state change");
        self.state = next;
        Ok(())
    }

    /// Records the generated context and moves to `Generated`
    pub(crate) fn generated(&mut self, dir: PathBuf) -> Result<(), OrchestratorError> {
        self.transition(JobState::Generated)?;
        self.context_dir = Some(dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Distro, SctVersion};

    fn job() -> BuildJob {
        BuildJob::new(BuildTarget::new(
            Distro::parse("debian:9").unwrap(),
            SctVersion::parse("master"),
        ))
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Pending);
        job.transition(JobState::Generating).unwrap();
        job.generated(PathBuf::from("sct-debian-9-master")).unwrap();
        job.transition(JobState::Building).unwrap();
        job.transition(JobState::Failed).unwrap();
        assert!(job.state().is_terminal());
        assert_eq!(job.context_dir(), Some(Path::new("sct-debian-9-master")));
    }

    #[test]
    fn test_cannot_skip_generation() {
        let mut job = job();
        let err = job.transition(JobState::Building).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidTransition {
                from: JobState::Pending,
                to: JobState::Building,
                ..
            }
        ));
        assert_eq!(job.state(), JobState::Pending);
    }

    #[test]
    fn test_failed_is_terminal() {
        for next in [
            JobState::Pending,
            JobState::Generating,
            JobState::Generated,
            JobState::Building,
            JobState::Succeeded,
            JobState::Failed,
        ] {
            assert!(!JobState::Failed.can_transition_to(next));
            assert!(!JobState::Succeeded.can_transition_to(next));
        }
    }
}
