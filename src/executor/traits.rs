//! Command execution traits
//!
//! The orchestrator only ever needs to run an argument vector and read back
//! its exit status. [`CommandRunner`] is that seam, so builds can be driven by
//! real processes or by a scripted runner in tests.

use super::errors::ExecutorError;
use async_trait::async_trait;

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `argv` as a subprocess and returns its exit status
    ///
    /// A process terminated by a signal reports `-1`. Dropping the returned
    /// future must stop the subprocess.
    async fn run(&self, argv: &[String]) -> Result<i32, ExecutorError>;
}

/// Health status of the container tooling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Tooling is available
    Healthy,

    /// Tooling is installed but not fully usable
    Degraded {
        /// Reason for degradation
        reason: String,
    },

    /// Tooling is unavailable
    Unhealthy {
        /// Reason for being unhealthy
        reason: String,
    },
}

impl HealthStatus {
    /// Returns true if the tooling is healthy or degraded
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unhealthy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_is_operational() {
        assert!(HealthStatus::Healthy.is_operational());
        assert!(
            HealthStatus::Degraded {
                reason: "daemon not reachable".to_string()
            }
            .is_operational()
        );
        assert!(
            !HealthStatus::Unhealthy {
                reason: "docker not found".to_string()
            }
            .is_operational()
        );
    }
}
