//! Feature flags for fragment generation

use serde::{Deserialize, Serialize};

/// Optional features layered on top of the base SCT image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildOptions {
    /// Install a C/C++ toolchain
    pub install_compilers: bool,

    /// Install git, wget and unzip
    pub install_tools: bool,

    /// Install FSLeyes into SCT's Python (pulls in compilers)
    pub install_fsleyes: bool,

    /// Build FSL from source (pulls in compilers)
    pub install_fsl: bool,

    /// Run an SSH server with X11 forwarding as the entrypoint
    pub configure_ssh: bool,

    /// Extra shell commands, each run as `bash -i -c '<command>'`
    pub commands: Vec<String>,

    /// Emit a reduced fragment for unknown distros instead of failing
    pub allow_unsupported: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            install_compilers: false,
            install_tools: false,
            install_fsleyes: false,
            install_fsl: false,
            configure_ssh: true,
            commands: Vec::new(),
            allow_unsupported: false,
        }
    }
}

impl BuildOptions {
    /// Options used for published release images
    #[must_use]
    pub fn release() -> Self {
        Self {
            install_fsleyes: true,
            configure_ssh: true,
            ..Self::default()
        }
    }

    /// Options used for test images
    #[must_use]
    pub fn testing(commands: Vec<String>) -> Self {
        Self {
            install_compilers: true,
            configure_ssh: false,
            commands,
            ..Self::default()
        }
    }

    /// Returns true if any feature needs a compiler toolchain
    #[must_use]
    pub fn needs_compilers(&self) -> bool {
        self.install_compilers || self.install_fsleyes || self.install_fsl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_configure_ssh_only() {
        let options = BuildOptions::default();
        assert!(options.configure_ssh);
        assert!(!options.needs_compilers());
        assert!(options.commands.is_empty());
    }

    #[test]
    fn test_fsleyes_needs_compilers() {
        assert!(BuildOptions::release().needs_compilers());
    }

    #[test]
    fn test_testing_preset() {
        let options = BuildOptions::testing(vec!["sct_check_dependencies".to_string()]);
        assert!(options.install_compilers);
        assert!(!options.configure_ssh);
        assert_eq!(options.commands.len(), 1);
    }
}
