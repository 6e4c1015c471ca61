//! Error types for command execution

use thiserror::Error;

/// Errors raised before a command produced an exit status
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The argument vector was empty
    #[error("Cannot run an empty command")]
    EmptyCommand,

    /// The process could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process failed
    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        /// Program being waited on.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
