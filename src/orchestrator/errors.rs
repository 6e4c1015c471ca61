//! Error types for build orchestration

use super::job::JobState;
use crate::fragment::FragmentError;
use thiserror::Error;

/// Errors that abort a whole orchestration run
///
/// A build that exits non-zero is not an error here; it is recorded in the
/// [`RunReport`](super::RunReport).
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Generating or writing a build context failed
    #[error(transparent)]
    Fragment(#[from] FragmentError),

    /// Two targets map to the same image name
    #[error("Duplicate image name '{name}' in target list")]
    DuplicateName {
        /// The repeated image name.
        name: String,
    },

    /// A job was moved through an invalid state transition
    #[error("Job '{name}' cannot go from {from} to {to}")]
    InvalidTransition {
        /// Image name of the job.
        name: String,
        /// Current state.
        from: JobState,
        /// Requested state.
        to: JobState,
    },

    /// The container tool is missing
    #[error("Container tool unavailable: {reason}")]
    DockerUnavailable {
        /// Why the health check failed.
        reason: String,
    },

    /// The operator interrupted the run
    #[error("Interrupted")]
    Interrupted,
}
