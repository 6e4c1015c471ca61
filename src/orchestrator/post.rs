//! Steps run after every build succeeded
//!
//! Steps run one at a time, in order. A failing step is recorded and the run
//! moves on; nothing already pushed or exported is undone.

use super::report::PostStepResult;
use crate::executor::CommandRunner;
use crate::infrastructure::DockerCli;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of post step, as recorded in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStepKind {
    /// Tag and push to a registry
    Publish,
    /// Export the SCT home directory as a tarball
    Export,
}

impl fmt::Display for PostStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => write!(f, "publish"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// A step applied to every built image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PostStep {
    /// `docker tag <image> <repository>:<image>` then `docker push`
    Publish {
        /// Registry repository, e.g. `neuropoly/sct`
        repository: String,
    },
    /// `docker run <image> tar ... | gzip > offline-archive-<image>.tar.gz`
    Export,
}

impl PostStep {
    /// Kind of this step
    #[must_use]
    pub fn kind(&self) -> PostStepKind {
        match self {
            Self::Publish { .. } => PostStepKind::Publish,
            Self::Export => PostStepKind::Export,
        }
    }

    /// Commands for one image, run in order until one fails
    #[must_use]
    pub fn commands(&self, docker: &DockerCli, image: &str) -> Vec<Vec<String>> {
        match self {
            Self::Publish { repository } => {
                let remote = format!("{repository}:{image}");
                vec![docker.tag(image, &remote), docker.push(&remote)]
            }
            Self::Export => vec![docker.export_home(image)],
        }
    }
}

/// Runs each step over every image, step by step
pub(crate) async fn run_post_steps<R>(
    runner: &R,
    docker: &DockerCli,
    steps: &[PostStep],
    images: &[String],
) -> Vec<PostStepResult>
where
    R: CommandRunner + ?Sized,
{
    let mut results = Vec::with_capacity(steps.len() * images.len());

    for step in steps {
        for image in images {
            let result = run_step(runner, docker, step, image).await;
            if result.is_success() {
                tracing::info!(step = %step.kind(), image = %image, "Post step finished");
            } else {
                tracing::error!(
                    step = %step.kind(),
                    image = %image,
                    exit_code = result.exit_code,
                    error = result.error.as_deref().unwrap_or(""),
                    "Post step failed"
                );
            }
            results.push(result);
        }
    }

    results
}

async fn run_step<R>(runner: &R, docker: &DockerCli, step: &PostStep, image: &str) -> PostStepResult
where
    R: CommandRunner + ?Sized,
{
    let mut result = PostStepResult {
        step: step.kind(),
        image: image.to_string(),
        exit_code: 0,
        error: None,
    };

    for argv in step.commands(docker, image) {
        tracing::info!(command = %shell_words::join(&argv), "Running post step");
        match runner.run(&argv).await {
            Ok(0) => {}
            Ok(code) => {
                result.exit_code = code;
                break;
            }
            Err(e) => {
                result.exit_code = -1;
                result.error = Some(e.to_string());
                break;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Records commands; fails any command containing `fail_on`
    struct Recorder {
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                fail_on: fail_on.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, argv: &[String]) -> Result<i32, ExecutorError> {
            let line = argv.join(" ");
            let failed = self.fail_on.as_ref().is_some_and(|f| line.contains(f.as_str()));
            self.calls.lock().push(line);
            Ok(i32::from(failed))
        }
    }

    fn images() -> Vec<String> {
        vec!["sct-master-debian-9".to_string(), "sct-master-fedora-27".to_string()]
    }

    #[tokio::test]
    async fn test_publish_then_export_in_order() {
        let runner = Recorder::new(None);
        let steps = vec![
            PostStep::Publish {
                repository: "neuropoly/sct".to_string(),
            },
            PostStep::Export,
        ];

        let results = run_post_steps(&runner, &DockerCli::default(), &steps, &images()).await;

        assert!(results.iter().all(PostStepResult::is_success));
        let calls = runner.calls.lock();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], "docker tag sct-master-debian-9 neuropoly/sct:sct-master-debian-9");
        assert_eq!(calls[1], "docker push neuropoly/sct:sct-master-debian-9");
        assert_eq!(calls[2], "docker tag sct-master-fedora-27 neuropoly/sct:sct-master-fedora-27");
        assert!(calls[4].starts_with("bash -c docker run sct-master-debian-9 tar"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_steps() {
        let runner = Recorder::new(Some("tag sct-master-debian-9"));
        let steps = vec![PostStep::Publish {
            repository: "neuropoly/sct".to_string(),
        }];

        let results = run_post_steps(&runner, &DockerCli::default(), &steps, &images()).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].is_success());
        assert!(results[1].is_success());

        let calls = runner.calls.lock();
        assert!(!calls.iter().any(|c| c == "docker push neuropoly/sct:sct-master-debian-9"));
        assert!(calls.iter().any(|c| c == "docker push neuropoly/sct:sct-master-fedora-27"));
    }
}
