//! SCT version handling
//!
//! A version is either a tagged release (`MAJOR.MINOR.PATCH`) or any other git
//! ref, which is treated as a development build.

#![allow(clippy::must_use_candidate)]

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static RELEASE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("release pattern is valid"));

const HOME: &str = "/home/sct";
const ARCHIVE_BASE: &str = "https://github.com/neuropoly/spinalcordtoolbox/archive";

/// Version of the Spinal Cord Toolbox to install
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SctVersion {
    /// A tagged release such as `3.1.1`
    Release(String),
    /// A branch or commit
    Development(String),
}

impl SctVersion {
    /// Classifies a version string
    pub fn parse(version: &str) -> Self {
        if RELEASE_PATTERN.is_match(version) {
            Self::Release(version.to_string())
        } else {
            Self::Development(version.to_string())
        }
    }

    /// The version string as given
    pub fn as_str(&self) -> &str {
        match self {
            Self::Release(v) | Self::Development(v) => v,
        }
    }

    /// Returns true for tagged releases
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release(_))
    }

    /// Directory SCT is installed into
    pub fn sct_dir(&self) -> String {
        match self {
            Self::Release(v) => format!("{HOME}/sct_{v}"),
            Self::Development(_) => format!("{HOME}/sct_dev"),
        }
    }

    /// Source archive to download
    pub fn archive_url(&self) -> String {
        match self {
            Self::Release(v) => format!("{ARCHIVE_BASE}/v{v}.tar.gz"),
            Self::Development(r) => format!("{ARCHIVE_BASE}/{r}.tar.gz"),
        }
    }

    /// Shell pattern matching the unpacked source directory
    ///
    /// GitHub names development archives after the resolved commit, so those
    /// need a trailing glob.
    pub fn source_dir_pattern(&self) -> String {
        match self {
            Self::Release(v) => format!("spinalcordtoolbox-{v}"),
            Self::Development(r) => format!("spinalcordtoolbox-{r}*"),
        }
    }
}

impl From<String> for SctVersion {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SctVersion> for String {
    fn from(version: SctVersion) -> Self {
        match version {
            SctVersion::Release(v) | SctVersion::Development(v) => v,
        }
    }
}

impl fmt::Display for SctVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("3.1.1", true)]
    #[case("4.0.0", true)]
    #[case("10.20.30", true)]
    #[case("master", false)]
    #[case("3.1", false)]
    #[case("v3.1.1", false)]
    #[case("3.1.1-rc1", false)]
    #[case("", false)]
    fn test_release_detection(#[case] version: &str, #[case] release: bool) {
        assert_eq!(SctVersion::parse(version).is_release(), release);
    }

    #[test]
    fn test_release_paths() {
        let version = SctVersion::parse("3.1.1");
        assert_eq!(version.sct_dir(), "/home/sct/sct_3.1.1");
        assert_eq!(
            version.archive_url(),
            "https://github.com/neuropoly/spinalcordtoolbox/archive/v3.1.1.tar.gz"
        );
        assert_eq!(version.source_dir_pattern(), "spinalcordtoolbox-3.1.1");
    }

    #[test]
    fn test_development_paths() {
        let version = SctVersion::parse("master");
        assert_eq!(version.sct_dir(), "/home/sct/sct_dev");
        assert_eq!(
            version.archive_url(),
            "https://github.com/neuropoly/spinalcordtoolbox/archive/master.tar.gz"
        );
        assert_eq!(version.source_dir_pattern(), "spinalcordtoolbox-master*");
    }
}
