//! Build targets and image naming

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::distro::Distro;
use super::errors::FragmentError;
use super::version::SctVersion;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static IMAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("image name pattern is valid"));

/// How image names are laid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "scheme")]
pub enum NamingScheme {
    /// `sct-<distro>-<version>`
    Single,
    /// `sct-<version>-<distro>`
    Release,
    /// `sct-testing-<distro>-<version>-<stamp>`
    Testing {
        /// Run stamp shared by every target of the run
        stamp: String,
    },
}

impl NamingScheme {
    /// Testing scheme stamped with the current local time
    pub fn testing_now() -> Self {
        Self::Testing {
            stamp: chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
        }
    }
}

/// A (distribution, version) pair to generate and build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Base image
    pub distro: Distro,
    /// SCT version
    pub version: SctVersion,
    /// Name layout
    pub scheme: NamingScheme,
    /// Explicit image name, overriding the scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BuildTarget {
    /// Creates a target using the [`NamingScheme::Single`] layout
    pub fn new(distro: Distro, version: SctVersion) -> Self {
        Self {
            distro,
            version,
            scheme: NamingScheme::Single,
            name: None,
        }
    }

    /// Sets the naming scheme
    pub fn with_scheme(mut self, scheme: NamingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets an explicit image name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Image tag and build-context directory name
    pub fn image_name(&self) -> String {
        let raw = match (&self.name, &self.scheme) {
            (Some(name), _) => name.clone(),
            (None, NamingScheme::Single) => format!("sct-{}-{}", self.distro, self.version),
            (None, NamingScheme::Release) => format!("sct-{}-{}", self.version, self.distro),
            (None, NamingScheme::Testing { stamp }) => {
                format!("sct-testing-{}-{}-{stamp}", self.distro, self.version)
            }
        };
        sanitize_image_name(&raw)
    }
}

/// Lowercases and replaces `:` and `/` so the name is usable both as an
/// image tag and as a single directory component
pub fn sanitize_image_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ':' | '/' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Checks that a sanitised name is usable as an image tag and as a
/// directory directly under the output root
///
/// # Errors
///
/// Returns [`FragmentError::InvalidImageName`] for names such as `.`, `..`
/// or `-x`.
pub fn validate_image_name(name: &str) -> Result<(), FragmentError> {
    if IMAGE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(FragmentError::InvalidImageName {
            name: name.to_string(),
        })
    }
}
