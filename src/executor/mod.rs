//! Command execution layer
//!
//! This module contains the runner seam and its subprocess implementation.

mod errors;
mod process;
mod traits;

pub use errors::ExecutorError;
pub use process::ProcessRunner;
pub use traits::{CommandRunner, HealthStatus};
