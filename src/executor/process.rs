//! Subprocess-backed command runner

use super::errors::ExecutorError;
use super::traits::CommandRunner;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;

/// Runs commands as child processes of the current process
///
/// Output is inherited, so build logs stream straight to the terminal.
/// Children are killed when their future is dropped, which is how an
/// interrupted run tears down in-flight builds.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cwd: Option<PathBuf>,
}

impl ProcessRunner {
    /// Creates a runner using the current working directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory for spawned commands
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> Result<i32, ExecutorError> {
        let (program, args) = argv.split_first().ok_or(ExecutorError::EmptyCommand)?;

        tracing::debug!(command = %shell_words::join(argv), "Executing command");
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| ExecutorError::Spawn {
            program: program.clone(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ExecutorError::Wait {
            program: program.clone(),
            source,
        })?;

        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(
            program = %program,
            exit_code,
            duration_ms = start.elapsed().as_millis(),
            "Command finished"
        );

        Ok(exit_code)
    }
}
