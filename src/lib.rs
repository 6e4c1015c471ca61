//! # sct-docker - Docker images for the Spinal Cord Toolbox
//!
//! Generates Dockerfiles that install the Spinal Cord Toolbox (SCT) on a
//! range of Linux distributions, and builds them in parallel with the
//! `docker` (or `podman`) CLI.
//!
//! ## Layout
//!
//! - [`fragment`]: distro/version/feature flags to Dockerfile text
//! - [`executor`]: the [`CommandRunner`] seam and its subprocess implementation
//! - [`orchestrator`]: generate, build in a bounded pool, run post steps
//! - [`infrastructure`]: configuration, logging, container CLI argv builders
//!
//! ## Example
//!
//! ```no_run
//! use sct_docker::fragment::{BuildOptions, BuildTarget, Distro, SctVersion};
//! use sct_docker::orchestrator::{Orchestrator, OrchestratorConfig};
//! use sct_docker::executor::ProcessRunner;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let targets = vec![BuildTarget::new(Distro::parse("debian:9")?, SctVersion::parse("4.0.0"))];
//! let config = OrchestratorConfig {
//!     options: BuildOptions::release(),
//!     ..OrchestratorConfig::default()
//! };
//! let report = Orchestrator::new(ProcessRunner::new(), config).run(targets).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod fragment;
pub mod infrastructure;
pub mod orchestrator;

// Re-export commonly used types
pub use executor::{CommandRunner, ExecutorError, HealthStatus, ProcessRunner};
pub use fragment::{
    BuildOptions, BuildTarget, Distro, Fragment, FragmentError, NamingScheme, SctVersion,
};
pub use infrastructure::{Config, ConfigError, DockerCli};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorError, PostStep, RunReport};

/// Version of the sct-docker crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
