//! Build and test orchestration
//!
//! An [`Orchestrator`] takes a list of [`BuildTarget`]s through three phases:
//!
//! 1. Generate every build context, one after the other. Any error here
//!    aborts the run before a single build starts.
//! 2. Build all images in parallel on a [`WorkerPool`]. A failing build does
//!    not stop its siblings.
//! 3. If every build succeeded, run the configured [`PostStep`]s in order.
//!
//! The outcome is a [`RunReport`]. An interrupt while waiting kills every
//! running child and returns [`OrchestratorError::Interrupted`] instead.

mod errors;
mod job;
mod pool;
mod post;
mod report;

pub use errors::OrchestratorError;
pub use job::{BuildJob, JobState};
pub use pool::{CommandOutcome, WorkerPool};
pub use post::{PostStep, PostStepKind};
pub use report::{
    EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS, EXIT_USAGE, JobResult, PostStepResult,
    RunReport,
};

use crate::executor::{CommandRunner, HealthStatus};
use crate::fragment::{self, BuildOptions, BuildTarget};
use crate::infrastructure::DockerCli;
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings for one orchestration run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Root directory for build contexts
    pub output_dir: PathBuf,
    /// Concurrent builds (`None` = available parallelism)
    pub jobs: Option<usize>,
    /// Options applied to every generated Dockerfile
    pub options: BuildOptions,
    /// Container CLI used for builds and post steps
    pub docker: DockerCli,
    /// Steps run after all builds succeeded
    pub post_steps: Vec<PostStep>,
    /// Check that the container CLI works before building
    pub check_docker: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            jobs: None,
            options: BuildOptions::default(),
            docker: DockerCli::default(),
            post_steps: Vec::new(),
            check_docker: true,
        }
    }
}

/// Generates, builds and post-processes a set of images
pub struct Orchestrator<R> {
    runner: Arc<R>,
    config: OrchestratorConfig,
}

impl<R> Orchestrator<R>
where
    R: CommandRunner + 'static,
{
    /// Creates an orchestrator running commands through `runner`
    pub fn new(runner: R, config: OrchestratorConfig) -> Self {
        Self {
            runner: Arc::new(runner),
            config,
        }
    }

    /// Run settings
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Writes the build context of every target, in order
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::DuplicateName`] if two targets share an
    /// image name, or the first generation or filesystem error.
    pub fn generate(&self, targets: Vec<BuildTarget>) -> Result<Vec<BuildJob>, OrchestratorError> {
        let mut seen = HashSet::new();
        for target in &targets {
            let name = target.image_name();
            if !seen.insert(name.clone()) {
                return Err(OrchestratorError::DuplicateName { name });
            }
        }

        let mut jobs = Vec::with_capacity(targets.len());
        for target in targets {
            let mut job = BuildJob::new(target);
            job.transition(JobState::Generating)?;
            let dir = fragment::materialize(&self.config.output_dir, job.target(), &self.config.options)?;
            job.generated(dir)?;
            jobs.push(job);
        }

        Ok(jobs)
    }

    /// Runs all phases, stopping early on Ctrl-C
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run_until`].
    pub async fn run(&self, targets: Vec<BuildTarget>) -> Result<RunReport, OrchestratorError> {
        self.run_until(targets, interrupt_signal()).await
    }

    /// Runs all phases, stopping early once `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails, the container CLI is missing, or
    /// `shutdown` resolves before the builds and post steps finished. Failing
    /// builds and post steps are not errors; they are recorded in the report.
    pub async fn run_until<F>(
        &self,
        targets: Vec<BuildTarget>,
        shutdown: F,
    ) -> Result<RunReport, OrchestratorError>
    where
        F: Future<Output = ()>,
    {
        let mut jobs = self.generate(targets)?;
        if jobs.is_empty() {
            tracing::warn!("No targets to build");
            return Ok(RunReport::default());
        }

        if self.config.check_docker {
            self.check_docker().await?;
        }

        let mut commands = Vec::with_capacity(jobs.len());
        for job in &mut jobs {
            job.transition(JobState::Building)?;
            let dir = job.context_dir().unwrap_or(&self.config.output_dir);
            commands.push(self.config.docker.build(job.name(), dir));
        }

        let pool = WorkerPool::new(self.config.jobs);
        tracing::info!(
            builds = jobs.len(),
            concurrency = pool.concurrency(),
            "Starting builds"
        );

        tokio::pin!(shutdown);
        let outcomes = pool
            .run_all(Arc::clone(&self.runner), commands, shutdown.as_mut())
            .await?;

        let mut report = RunReport::default();
        for (mut job, outcome) in jobs.into_iter().zip(outcomes) {
            if outcome.is_success() {
                job.transition(JobState::Succeeded)?;
                tracing::info!(image = %job.name(), "Build succeeded");
            } else {
                job.transition(JobState::Failed)?;
                tracing::error!(
                    image = %job.name(),
                    exit_code = outcome.exit_code,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Build failed"
                );
            }
            report.jobs.push(JobResult {
                name: job.name().to_string(),
                distro: job.target().distro.image().to_string(),
                context_dir: job.context_dir().map(PathBuf::from).unwrap_or_default(),
                state: job.state(),
                exit_code: outcome.exit_code,
                error: outcome.error,
            });
        }

        if self.config.post_steps.is_empty() {
            return Ok(report);
        }
        if !report.builds_succeeded() {
            tracing::warn!("Some builds failed, skipping post steps");
            return Ok(report);
        }

        let images: Vec<String> = report.jobs.iter().map(|j| j.name.clone()).collect();
        let post = post::run_post_steps(
            self.runner.as_ref(),
            &self.config.docker,
            &self.config.post_steps,
            &images,
        );

        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::warn!("Interrupted during post steps");
                Err(OrchestratorError::Interrupted)
            }

            results = post => {
                report.post_steps = results;
                Ok(report)
            }
        }
    }

    async fn check_docker(&self) -> Result<(), OrchestratorError> {
        match self.config.docker.health_check().await {
            HealthStatus::Healthy => Ok(()),
            HealthStatus::Degraded { reason } => {
                tracing::warn!(reason = %reason, "Container tool degraded, building anyway");
                Ok(())
            }
            HealthStatus::Unhealthy { reason } => Err(OrchestratorError::DockerUnavailable { reason }),
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
