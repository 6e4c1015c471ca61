//! Distribution parsing and package-manager family selection

#![allow(clippy::must_use_candidate)]

use super::errors::FragmentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flavor of an RPM-based distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpmFlavor {
    /// Fedora images
    Fedora,
    /// CentOS images
    CentOs,
}

/// Closed set of distribution families the generator knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistroFamily {
    /// Debian and Ubuntu images
    DebianLike,
    /// Fedora and CentOS images
    RpmLike(RpmFlavor),
    /// Anything else
    Unsupported,
}

impl DistroFamily {
    /// Returns true for Debian and Ubuntu
    pub fn is_debian_like(self) -> bool {
        matches!(self, Self::DebianLike)
    }

    /// Returns true if the family is known
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebianLike => write!(f, "debian-like"),
            Self::RpmLike(RpmFlavor::Fedora) => write!(f, "fedora"),
            Self::RpmLike(RpmFlavor::CentOs) => write!(f, "centos"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Package manager used inside the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// `apt-get`
    Apt,
    /// `yum`
    Yum,
    /// `dnf`
    Dnf,
}

impl PackageManager {
    /// Returns the executable name
    pub fn command(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Yum => "yum",
            Self::Dnf => "dnf",
        }
    }
}

/// A base image such as `ubuntu:18.04` or `library/debian:9`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Distro {
    image: String,
    family: DistroFamily,
}

impl Distro {
    /// Parses a distro, rejecting only empty strings
    ///
    /// Unknown images parse into [`DistroFamily::Unsupported`]; whether that
    /// is an error is decided by the fragment builder.
    pub fn parse(image: &str) -> Result<Self, FragmentError> {
        let image = image.trim();
        if image.is_empty() {
            return Err(FragmentError::EmptyDistro);
        }

        // Prefix match on the whole reference: `myorg/centos:7` is unsupported.
        let family = if image.starts_with("debian") || image.starts_with("ubuntu") {
            DistroFamily::DebianLike
        } else if image.starts_with("fedora") {
            DistroFamily::RpmLike(RpmFlavor::Fedora)
        } else if image.starts_with("centos") {
            DistroFamily::RpmLike(RpmFlavor::CentOs)
        } else {
            DistroFamily::Unsupported
        };

        Ok(Self {
            image: image.to_string(),
            family,
        })
    }

    /// Full image reference as given
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Package-manager family
    pub fn family(&self) -> DistroFamily {
        self.family
    }

    /// Returns true if the image is exactly `name` (e.g. `debian:7`)
    pub fn is(&self, name: &str) -> bool {
        self.image == name
    }

    /// Package manager used for the base system setup
    ///
    /// `centos:6` and `centos:7` still ship `yum`; every other RPM image
    /// uses `dnf`.
    pub fn package_manager(&self) -> Option<PackageManager> {
        match self.family {
            DistroFamily::DebianLike => Some(PackageManager::Apt),
            DistroFamily::RpmLike(RpmFlavor::CentOs)
                if self.is("centos:6") || self.is("centos:7") =>
            {
                Some(PackageManager::Yum)
            }
            DistroFamily::RpmLike(_) => Some(PackageManager::Dnf),
            DistroFamily::Unsupported => None,
        }
    }
}

impl FromStr for Distro {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Distro {
    type Error = FragmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Distro> for String {
    fn from(distro: Distro) -> Self {
        distro.image
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("ubuntu:16.04", DistroFamily::DebianLike)]
    #[case("debian:9", DistroFamily::DebianLike)]
    #[case("fedora:27", DistroFamily::RpmLike(RpmFlavor::Fedora))]
    #[case("centos:7", DistroFamily::RpmLike(RpmFlavor::CentOs))]
    #[case("centos:8", DistroFamily::RpmLike(RpmFlavor::CentOs))]
    #[case("alpine:3.9", DistroFamily::Unsupported)]
    #[case("centos", DistroFamily::RpmLike(RpmFlavor::CentOs))]
    #[case("library/ubuntu:18.04", DistroFamily::Unsupported)]
    #[case("myorg/centos:7", DistroFamily::Unsupported)]
    fn test_family_selection(#[case] image: &str, #[case] family: DistroFamily) {
        assert_eq!(Distro::parse(image).unwrap().family(), family);
    }

    #[rstest]
    #[case("ubuntu:18.04", Some(PackageManager::Apt))]
    #[case("centos:6", Some(PackageManager::Yum))]
    #[case("centos:7", Some(PackageManager::Yum))]
    #[case("centos:8", Some(PackageManager::Dnf))]
    #[case("fedora:29", Some(PackageManager::Dnf))]
    #[case("centos:7.6.1810", Some(PackageManager::Dnf))]
    #[case("quay.io/centos:7", None)]
    #[case("archlinux", None)]
    fn test_package_manager(#[case] image: &str, #[case] manager: Option<PackageManager>) {
        assert_eq!(Distro::parse(image).unwrap().package_manager(), manager);
    }

    #[test]
    fn test_empty_distro_rejected() {
        assert!(matches!(
            Distro::parse("   "),
            Err(FragmentError::EmptyDistro)
        ));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let distro = Distro::parse("  debian:7 ").unwrap();
        assert_eq!(distro.image(), "debian:7");
        assert!(distro.is("debian:7"));
    }

    #[test]
    fn test_serde_as_string() {
        let distro: Distro = serde_json::from_str(r#""fedora:30""#).unwrap();
        assert_eq!(distro.family(), DistroFamily::RpmLike(RpmFlavor::Fedora));
        assert_eq!(serde_json::to_string(&distro).unwrap(), r#""fedora:30""#);
    }
}
