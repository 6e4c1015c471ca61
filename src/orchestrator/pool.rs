//! Bounded worker pool over external commands
//!
//! Every command runs in its own tokio task holding a semaphore permit, so at
//! most `concurrency` commands run at once. The pool waits for every task,
//! unless the shutdown future resolves first, in which case all tasks are
//! aborted and their child processes killed.

use super::errors::OrchestratorError;
use crate::executor::CommandRunner;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Exit status of one pooled command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code, `-1` if the command never produced one
    pub exit_code: i32,
    /// Why the command could not run, if it did not
    pub error: Option<String>,
}

impl CommandOutcome {
    /// Outcome of a command that ran to completion
    #[must_use]
    pub fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            error: None,
        }
    }

    /// Outcome of a command that could not run
    #[must_use]
    pub fn errored(error: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            error: Some(error.into()),
        }
    }

    /// Returns true if the command exited 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }
}

/// Fixed-size pool of command slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// Creates a pool; `None` or `0` uses the available parallelism
    #[must_use]
    pub fn new(concurrency: Option<usize>) -> Self {
        let concurrency = match concurrency {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        };
        Self { concurrency }
    }

    /// Number of commands allowed to run at once
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every command and returns their outcomes in input order
    ///
    /// A failing command never cancels its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Interrupted`] if `shutdown` resolves
    /// before every command finished. No outcomes are returned in that case.
    pub async fn run_all<R, F>(
        &self,
        runner: Arc<R>,
        commands: Vec<Vec<String>>,
        shutdown: F,
    ) -> Result<Vec<CommandOutcome>, OrchestratorError>
    where
        R: CommandRunner + 'static,
        F: Future<Output = ()>,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut outcomes: Vec<Option<CommandOutcome>> = vec![None; commands.len()];
        let mut tasks = JoinSet::new();

        tracing::debug!(
            commands = commands.len(),
            concurrency = self.concurrency,
            "Submitting commands to worker pool"
        );

        for (index, argv) in commands.into_iter().enumerate() {
            let runner = Arc::clone(&runner);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = match runner.run(&argv).await {
                    Ok(code) => CommandOutcome::exited(code),
                    Err(e) => CommandOutcome::errored(e.to_string()),
                };
                (index, outcome)
            });
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::warn!(in_flight = tasks.len(), "Interrupted, terminating builds");
                    tasks.abort_all();
                    while tasks.join_next().await.is_some() {}
                    return Err(OrchestratorError::Interrupted);
                }

                next = tasks.join_next() => match next {
                    Some(Ok((index, outcome))) => outcomes[index] = Some(outcome),
                    Some(Err(e)) => tracing::error!(error = %e, "Build task panicked"),
                    None => break,
                },
            }
        }

        // Only a panicked task leaves its slot empty.
        Ok(outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| CommandOutcome::errored("build task panicked")))
            .collect())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(None)
    }
}
