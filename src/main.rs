//! sct-docker - Docker images for the Spinal Cord Toolbox
//!
//! Generates per-distribution Dockerfiles for SCT and drives `docker build`
//! over all of them in parallel.
//!
//! ## Commands
//!
//! - `sct-docker generate` - Write one Dockerfile build context
//! - `sct-docker build` - Build release images, optionally publish and export them
//! - `sct-docker test` - Build testing images that run the SCT test suite
//! - `sct-docker completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # One Dockerfile
//! sct-docker generate --distro ubuntu:18.04 --version 4.0.0 --install-fsleyes
//!
//! # Release images for the configured distros, four at a time
//! sct-docker build --version 4.0.0 --jobs 4 --publish-under neuropoly/sct
//!
//! # Testing images, with a JSON report
//! sct-docker test --distros debian:9,centos:7 --report report.json
//! ```
//!
//! ## Exit status
//!
//! `0` everything succeeded, `1` a build or post step failed, `2` bad
//! configuration or filesystem error, `130` interrupted.

use clap::Parser;
use sct_docker::orchestrator::EXIT_USAGE;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    match cli::run(args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("SCT_DOCKER_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::from(u8::try_from(EXIT_USAGE).unwrap_or(2))
        }
    }
}
