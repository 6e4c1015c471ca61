//! Infrastructure layer
//!
//! Configuration, logging and the container CLI.

mod config;
pub mod docker;
mod logging;

pub use config::{Config, ConfigError};
pub use docker::{DockerCli, offline_archive_name};
pub use logging::{default_filter, init_logging};
