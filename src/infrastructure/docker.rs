//! Docker command line
//!
//! Builds the argument vectors for the container tool. Nothing here parses
//! tool output; callers only look at exit codes.

use crate::executor::HealthStatus;
use std::path::Path;
use tokio::process::Command;

/// Home directory of the `sct` user inside generated images
const SCT_HOME: &str = "/home/sct";

/// Argument-vector builder for a docker-compatible CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCli {
    program: String,
    no_cache: bool,
}

impl DockerCli {
    /// Creates a builder for the given binary (`docker`, `podman`, ...)
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            no_cache: false,
        }
    }

    /// Passes `--no-cache` to builds
    #[must_use]
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Binary name
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// `docker build -t <tag> <context>`
    #[must_use]
    pub fn build(&self, tag: &str, context: &Path) -> Vec<String> {
        let mut argv = vec![self.program.clone(), "build".to_string()];
        if self.no_cache {
            argv.push("--no-cache".to_string());
        }
        argv.extend([
            "-t".to_string(),
            tag.to_string(),
            context.to_string_lossy().into_owned(),
        ]);
        argv
    }

    /// `docker tag <source> <target>`
    #[must_use]
    pub fn tag(&self, source: &str, target: &str) -> Vec<String> {
        vec![
            self.program.clone(),
            "tag".to_string(),
            source.to_string(),
            target.to_string(),
        ]
    }

    /// `docker push <image>`
    #[must_use]
    pub fn push(&self, image: &str) -> Vec<String> {
        vec![self.program.clone(), "push".to_string(), image.to_string()]
    }

    /// Pipes a tarball of the image's SCT home into
    /// `offline-archive-<image>.tar.gz`
    #[must_use]
    pub fn export_home(&self, image: &str) -> Vec<String> {
        let pipeline = format!(
            "{} run {} tar --directory={SCT_HOME} --create . | gzip > {}",
            shell_words::quote(&self.program),
            shell_words::quote(image),
            shell_words::quote(&offline_archive_name(image)),
        );
        vec!["bash".to_string(), "-c".to_string(), pipeline]
    }

    /// Checks that the binary exists and its daemon answers
    pub async fn health_check(&self) -> HealthStatus {
        let version = Command::new(&self.program).arg("--version").output().await;
        match version {
            Ok(o) if o.status.success() => {}
            Ok(_) => {
                return HealthStatus::Unhealthy {
                    reason: format!("{} --version failed", self.program),
                };
            }
            Err(e) => {
                return HealthStatus::Unhealthy {
                    reason: format!("{} is not available: {e}", self.program),
                };
            }
        }

        match Command::new(&self.program).arg("info").output().await {
            Ok(o) if o.status.success() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded {
                reason: format!("{} daemon may not be running", self.program),
            },
            Err(e) => HealthStatus::Degraded {
                reason: format!("{} info failed: {e}", self.program),
            },
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// File name of the exported archive for an image
#[must_use]
pub fn offline_archive_name(image: &str) -> String {
    format!("offline-archive-{image}.tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_argv() {
        let argv = DockerCli::default().build("sct-master-debian-9", Path::new("sct-master-debian-9"));
        assert_eq!(
            argv,
            vec!["docker", "build", "-t", "sct-master-debian-9", "sct-master-debian-9"]
        );
    }

    #[test]
    fn test_build_argv_no_cache() {
        let argv = DockerCli::new("podman")
            .with_no_cache(true)
            .build("img", Path::new("/tmp/img"));
        assert_eq!(argv, vec!["podman", "build", "--no-cache", "-t", "img", "/tmp/img"]);
    }

    #[test]
    fn test_tag_and_push_argv() {
        let cli = DockerCli::default();
        assert_eq!(
            cli.tag("img", "neuropoly/sct:img"),
            vec!["docker", "tag", "img", "neuropoly/sct:img"]
        );
        assert_eq!(cli.push("neuropoly/sct:img"), vec!["docker", "push", "neuropoly/sct:img"]);
    }

    #[test]
    fn test_export_pipeline() {
        let argv = DockerCli::default().export_home("sct-3.1.1-ubuntu-18.04");
        assert_eq!(argv[0], "bash");
        assert_eq!(argv[1], "-c");
        assert_eq!(
            argv[2],
            "docker run sct-3.1.1-ubuntu-18.04 tar --directory=/home/sct --create . \
             | gzip > offline-archive-sct-3.1.1-ubuntu-18.04.tar.gz"
        );
    }

    #[tokio::test]
    async fn test_health_check_missing_binary() {
        let status = DockerCli::new("definitely-not-a-real-binary-sct")
            .health_check()
            .await;
        assert!(!status.is_operational());
    }
}
