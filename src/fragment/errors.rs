//! Error types for fragment generation

use super::builder::BlockKind;
use thiserror::Error;

/// Errors that can occur while generating or writing a Dockerfile fragment
#[derive(Error, Debug)]
pub enum FragmentError {
    /// The distro string was empty
    #[error("Distro cannot be empty")]
    EmptyDistro,

    /// The distro does not belong to a known package-manager family
    #[error("Unsupported distro '{distro}': expected a debian, ubuntu, fedora or centos image")]
    UnsupportedDistro {
        /// The rejected distro string.
        distro: String,
    },

    /// The image name is not a usable tag and directory name
    #[error("Invalid image name '{name}': must start with a lowercase letter or digit and contain only [a-z0-9._-]")]
    InvalidImageName {
        /// The rejected name.
        name: String,
    },

    /// A directive block was appended after a block that must follow it
    #[error("Block {block:?} cannot follow {after:?}")]
    OutOfOrder {
        /// Kind of the block being appended.
        block: BlockKind,
        /// Kind of the last block already in the fragment.
        after: BlockKind,
    },

    /// Writing the build context failed
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Path that could not be created or written.
        path: std::path::PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
