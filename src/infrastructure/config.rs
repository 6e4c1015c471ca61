//! Configuration management
//!
//! Every default the tool relies on (distro lists, version, test commands)
//! lives in [`Config`] and is handed to the orchestrator explicitly. A YAML
//! file can override any subset of the fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Config`]
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container CLI binary
    pub docker: String,
    /// Directory build contexts are written to
    pub output_dir: PathBuf,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// SCT version built when none is given
    pub default_version: String,
    /// Concurrent builds (`None` = available parallelism)
    pub jobs: Option<usize>,
    /// Distros for published images
    pub image_distros: Vec<String>,
    /// Distros for test runs
    pub testing_distros: Vec<String>,
    /// Commands baked into test images
    pub testing_commands: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            default_version: "master".to_string(),
            jobs: None,
            image_distros: strings(&[
                "ubuntu:14.04",
                "ubuntu:16.04",
                "ubuntu:18.04",
                "debian:8",
                "debian:9",
                "fedora:25",
                "fedora:26",
                "fedora:27",
            ]),
            testing_distros: strings(&[
                "ubuntu:14.04",
                "ubuntu:16.04",
                "ubuntu:18.04",
                "ubuntu:18.10",
                "ubuntu:19.04",
                "debian:7",
                "debian:8",
                "debian:9",
                "fedora:25",
                "fedora:26",
                "fedora:27",
                "fedora:28",
                "fedora:29",
                "fedora:30",
                "centos:7",
            ]),
            testing_commands: strings(&[
                "MPLBACKEND=Agg sct_testing -d 0",
                "MPLBACKEND=Agg ${SCT_DIR}/batch_processing.sh -nodownload",
            ]),
        }
    }
}

impl Config {
    /// Loads a YAML config file; missing fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses YAML text
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text does not describe a [`Config`].
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.docker, "docker");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_version, "master");
        assert_eq!(config.image_distros.len(), 8);
        assert!(config.testing_distros.contains(&"centos:7".to_string()));
        assert!(config.jobs.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("docker: podman\njobs: 3\nimage_distros: [\"debian:9\"]\n")
            .unwrap();
        assert_eq!(config.docker, "podman");
        assert_eq!(config.jobs, Some(3));
        assert_eq!(config.image_distros, vec!["debian:9".to_string()]);
        assert_eq!(config.testing_commands, Config::default().testing_commands);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/sct-docker.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "jobs: [not, a, number]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
