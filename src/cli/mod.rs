//! Command-line interface for sct-docker
//!
//! - `generate`: write one Dockerfile build context
//! - `build`: generate and build release images, optionally publish them
//! - `test`: generate and build testing images
//! - `completions`: generate shell completions

pub mod completions;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use sct_docker::executor::ProcessRunner;
use sct_docker::fragment::{self, BuildOptions, BuildTarget, Distro, NamingScheme, SctVersion};
use sct_docker::infrastructure::{Config, DockerCli, init_logging};
use sct_docker::orchestrator::{
    EXIT_INTERRUPTED, EXIT_SUCCESS, Orchestrator, OrchestratorConfig, OrchestratorError, PostStep,
    RunReport,
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// CLI arguments for sct-docker
#[derive(Parser, Debug)]
#[command(name = "sct-docker")]
#[command(author, version, about = "Generate and build Spinal Cord Toolbox Docker images", long_about = None)]
pub struct Args {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory build contexts are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write the run report as JSON to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Container CLI binary (e.g. podman)
    #[arg(long, global = true)]
    docker: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the Dockerfile for one distro and version
    Generate {
        /// Base image, e.g. ubuntu:16.04
        #[arg(long)]
        distro: String,
        /// SCT release (3.1.1) or git ref (master)
        #[arg(long)]
        version: Option<String>,
        /// Image and directory name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        features: FeatureArgs,
    },

    /// Build release images
    Build {
        #[command(flatten)]
        run: RunArgs,
        /// Tag and push every image under this repository
        #[arg(long, value_name = "ORG/REPO")]
        publish_under: Option<String>,
        /// Export each image's SCT home as offline-archive-<image>.tar.gz
        #[arg(long)]
        export_offline_archive: bool,
    },

    /// Build testing images that run the SCT test suite
    Test {
        #[command(flatten)]
        run: RunArgs,
        /// Command run inside the image (repeatable)
        #[arg(long = "command", value_name = "COMMAND")]
        commands: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short = 'f', long = "file")]
        output: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
struct FeatureArgs {
    /// Install a C/C++ toolchain
    #[arg(long)]
    install_compilers: bool,
    /// Install git, wget and unzip
    #[arg(long)]
    install_tools: bool,
    /// Install FSLeyes
    #[arg(long)]
    install_fsleyes: bool,
    /// Build FSL from source
    #[arg(long)]
    install_fsl: bool,
    /// Do not configure an SSH server
    #[arg(long)]
    no_ssh: bool,
    /// Extra command run during the build (repeatable)
    #[arg(long = "command", value_name = "COMMAND")]
    commands: Vec<String>,
    /// Generate a reduced Dockerfile for unknown distros
    #[arg(long)]
    allow_unsupported: bool,
}

impl FeatureArgs {
    fn options(self) -> BuildOptions {
        BuildOptions {
            install_compilers: self.install_compilers,
            install_tools: self.install_tools,
            install_fsleyes: self.install_fsleyes,
            install_fsl: self.install_fsl,
            configure_ssh: !self.no_ssh,
            commands: self.commands,
            allow_unsupported: self.allow_unsupported,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Base images (comma separated or repeated); defaults from config
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    distros: Vec<String>,
    /// SCT release (3.1.1) or git ref (master)
    #[arg(long)]
    version: Option<String>,
    /// Concurrent builds
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Pass --no-cache to docker build
    #[arg(long)]
    no_cache: bool,
    /// Generate reduced Dockerfiles for unknown distros
    #[arg(long)]
    allow_unsupported: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<ShellArg> for clap_complete::Shell {
    fn from(shell: ShellArg) -> Self {
        match shell {
            ShellArg::Bash => Self::Bash,
            ShellArg::Zsh => Self::Zsh,
            ShellArg::Fish => Self::Fish,
            ShellArg::PowerShell => Self::PowerShell,
            ShellArg::Elvish => Self::Elvish,
        }
    }
}

/// Executes parsed arguments and returns the process exit status
pub fn run(args: Args) -> Result<i32> {
    let config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::default(),
    };

    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level));

    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    let docker = args.docker.clone().unwrap_or_else(|| config.docker.clone());

    match args.command {
        Command::Generate {
            distro,
            version,
            name,
            features,
        } => {
            let target = target(&distro, version.as_deref().unwrap_or(&config.default_version))?;
            let target = match name {
                Some(name) => target.with_name(name),
                None => target,
            };
            let mut stdout = std::io::stdout().lock();
            generate_context(&mut stdout, &output_dir, &target, &features.options())?;
            Ok(EXIT_SUCCESS)
        }
        Command::Build {
            run,
            publish_under,
            export_offline_archive,
        } => {
            let mut post_steps = Vec::new();
            if let Some(repository) = publish_under {
                post_steps.push(PostStep::Publish { repository });
            }
            if export_offline_archive {
                post_steps.push(PostStep::Export);
            }

            let distros = or_default(&run.distros, &config.image_distros);
            let targets = targets(
                distros,
                run.version.as_deref().unwrap_or(&config.default_version),
                &NamingScheme::Release,
            )?;
            let options = BuildOptions {
                allow_unsupported: run.allow_unsupported,
                ..BuildOptions::release()
            };
            let settings = orchestrator_config(&run, &config, output_dir, docker, options, post_steps);
            orchestrate(settings, targets, args.report.as_deref())
        }
        Command::Test { run, commands } => {
            let commands = if commands.is_empty() {
                config.testing_commands.clone()
            } else {
                commands
            };

            let distros = or_default(&run.distros, &config.testing_distros);
            let targets = targets(
                distros,
                run.version.as_deref().unwrap_or(&config.default_version),
                &NamingScheme::testing_now(),
            )?;
            let options = BuildOptions {
                allow_unsupported: run.allow_unsupported,
                ..BuildOptions::testing(commands)
            };
            let settings = orchestrator_config(&run, &config, output_dir, docker, options, Vec::new());
            orchestrate(settings, targets, args.report.as_deref())
        }
        Command::Completions { shell, output } => {
            let completions = completions::generate_completions(shell.into())?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Writes one build context and prints its image name, which is also the
/// directory name under `output_dir`
fn generate_context(
    out: &mut impl Write,
    output_dir: &Path,
    target: &BuildTarget,
    options: &BuildOptions,
) -> Result<()> {
    fragment::materialize(output_dir, target, options).context("Failed to generate Dockerfile")?;
    writeln!(out, "{}", target.image_name()).context("Failed to print image name")?;
    Ok(())
}

fn target(distro: &str, version: &str) -> Result<BuildTarget> {
    let distro = Distro::parse(distro).with_context(|| format!("Invalid distro '{distro}'"))?;
    Ok(BuildTarget::new(distro, SctVersion::parse(version)))
}

fn targets(distros: &[String], version: &str, scheme: &NamingScheme) -> Result<Vec<BuildTarget>> {
    distros
        .iter()
        .map(|d| Ok(target(d, version)?.with_scheme(scheme.clone())))
        .collect()
}

fn or_default<'a>(given: &'a [String], default: &'a [String]) -> &'a [String] {
    if given.is_empty() { default } else { given }
}

fn orchestrator_config(
    run: &RunArgs,
    config: &Config,
    output_dir: PathBuf,
    docker: String,
    options: BuildOptions,
    post_steps: Vec<PostStep>,
) -> OrchestratorConfig {
    OrchestratorConfig {
        output_dir,
        jobs: run.jobs.or(config.jobs),
        options,
        docker: DockerCli::new(docker).with_no_cache(run.no_cache),
        post_steps,
        check_docker: true,
    }
}

fn orchestrate(
    settings: OrchestratorConfig,
    targets: Vec<BuildTarget>,
    report_path: Option<&Path>,
) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let orchestrator = Orchestrator::new(ProcessRunner::new(), settings);
    let report = match runtime.block_on(orchestrator.run(targets)) {
        Ok(report) => report,
        Err(OrchestratorError::Interrupted) => {
            tracing::warn!("Run interrupted");
            return Ok(EXIT_INTERRUPTED);
        }
        Err(e) => return Err(e).context("Build run aborted"),
    };

    if let Some(path) = report_path {
        write_report(&report, path)?;
    }

    if report.is_success() {
        tracing::info!(images = report.jobs.len(), "All builds succeeded");
    } else {
        for job in report.failed_jobs() {
            tracing::error!(image = %job.name, exit_code = job.exit_code, "Failed");
        }
    }

    Ok(report.exit_code())
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_post_steps() {
        let args = Args::try_parse_from([
            "sct-docker",
            "build",
            "--distros",
            "debian:9,fedora:27",
            "--publish-under",
            "neuropoly/sct",
            "--export-offline-archive",
        ])
        .unwrap();

        match args.command {
            Command::Build {
                run,
                publish_under,
                export_offline_archive,
            } => {
                assert_eq!(run.distros, vec!["debian:9", "fedora:27"]);
                assert_eq!(publish_under.as_deref(), Some("neuropoly/sct"));
                assert!(export_offline_archive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "sct-docker",
            "test",
            "--command",
            "sct_check_dependencies",
            "--output-dir",
            "/tmp/contexts",
        ])
        .unwrap();

        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/contexts")));
        match args.command {
            Command::Test { commands, .. } => assert_eq!(commands, vec!["sct_check_dependencies"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_feature_flags_map_to_options() {
        let features = FeatureArgs {
            install_fsl: true,
            no_ssh: true,
            commands: vec!["echo hi".to_string()],
            ..FeatureArgs::default()
        };
        let options = features.options();
        assert!(options.install_fsl);
        assert!(!options.configure_ssh);
        assert_eq!(options.commands, vec!["echo hi"]);
    }

    #[test]
    fn test_targets_use_scheme() {
        let distros = vec!["debian:9".to_string()];
        let targets = targets(&distros, "3.1.1", &NamingScheme::Release).unwrap();
        assert_eq!(targets[0].image_name(), "sct-3.1.1-debian-9");
    }

    #[test]
    fn test_empty_distro_rejected() {
        assert!(target("  ", "master").is_err());
    }

    #[test]
    fn test_generate_prints_bare_image_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = target("ubuntu:16.04", "3.1.1").unwrap();
        let mut out = Vec::new();

        generate_context(&mut out, dir.path(), &target, &BuildOptions::default()).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "sct-ubuntu-16.04-3.1.1\n");
        assert!(dir.path().join("sct-ubuntu-16.04-3.1.1").join("Dockerfile").is_file());
    }

    #[test]
    fn test_generate_rejects_dot_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = target("ubuntu:16.04", "3.1.1").unwrap().with_name("..");
        let mut out = Vec::new();

        assert!(generate_context(&mut out, dir.path(), &target, &BuildOptions::default()).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_generate_writes_context() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "sct-docker",
            "generate",
            "--distro",
            "ubuntu:16.04",
            "--version",
            "3.1.1",
            "--output-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(run(args).unwrap(), EXIT_SUCCESS);
        let dockerfile = dir.path().join("sct-ubuntu-16.04-3.1.1").join("Dockerfile");
        let text = std::fs::read_to_string(dockerfile).unwrap();
        assert!(text.starts_with("FROM ubuntu:16.04"));
    }
}
