//! Dockerfile fragment generation
//!
//! Maps a base distribution, an SCT version and a set of feature flags to a
//! Dockerfile, and writes it into a per-target build context.

pub mod builder;
pub mod distro;
pub mod errors;
pub mod generate;
pub mod options;
pub mod target;
pub mod version;

pub use builder::{BlockKind, DirectiveBlock, Fragment};
pub use distro::{Distro, DistroFamily, PackageManager, RpmFlavor};
pub use errors::FragmentError;
pub use generate::{DOCKERFILE_NAME, GeneratedFragment, build, materialize, render_fragment};
pub use options::BuildOptions;
pub use target::{BuildTarget, NamingScheme, sanitize_image_name, validate_image_name};
pub use version::SctVersion;
