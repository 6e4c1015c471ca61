//! Dockerfile generation for SCT images
//!
//! [`build`] turns a distro, a version and a set of [`BuildOptions`] into a
//! [`Fragment`]. [`materialize`] writes it into a build-context directory.

use super::builder::{BlockKind, DirectiveBlock, Fragment};
use super::distro::{Distro, DistroFamily, PackageManager, RpmFlavor};
use super::errors::FragmentError;
use super::options::BuildOptions;
use super::target::{BuildTarget, validate_image_name};
use super::version::SctVersion;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the generated file inside each build context
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Result of generating a fragment for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFragment {
    /// Image tag, also the build-context directory name
    pub image_name: String,
    /// The generated Dockerfile
    pub fragment: Fragment,
}

/// Generates the Dockerfile for a target
///
/// # Errors
///
/// Returns [`FragmentError::UnsupportedDistro`] for distros outside the known
/// families unless `options.allow_unsupported` is set, and
/// [`FragmentError::InvalidImageName`] if the name cannot be used as an image
/// tag and directory.
pub fn build(target: &BuildTarget, options: &BuildOptions) -> Result<GeneratedFragment, FragmentError> {
    let image_name = target.image_name();
    validate_image_name(&image_name)?;
    let fragment = render_fragment(&target.distro, &target.version, options)?;
    Ok(GeneratedFragment {
        image_name,
        fragment,
    })
}

/// Generates the Dockerfile for a target and writes it to
/// `<root>/<image name>/Dockerfile`, returning the directory
///
/// The directory is created if missing; an existing Dockerfile is replaced.
///
/// # Errors
///
/// Propagates generation errors and any failure to create the directory or
/// write the file.
pub fn materialize(
    root: &Path,
    target: &BuildTarget,
    options: &BuildOptions,
) -> Result<PathBuf, FragmentError> {
    let generated = build(target, options)?;
    let dir = root.join(&generated.image_name);

    fs::create_dir_all(&dir).map_err(|source| FragmentError::Io {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(DOCKERFILE_NAME);
    fs::write(&path, generated.fragment.render())
        .map_err(|source| FragmentError::Io { path, source })?;

    tracing::info!(
        image = %generated.image_name,
        dir = %dir.display(),
        "You can now run: docker build -t {} {}",
        generated.image_name,
        dir.display()
    );

    Ok(dir)
}

/// Generates the fragment for a distro and version
///
/// # Errors
///
/// See [`build`].
pub fn render_fragment(
    distro: &Distro,
    version: &SctVersion,
    options: &BuildOptions,
) -> Result<Fragment, FragmentError> {
    let family = distro.family();
    if !family.is_supported() {
        if !options.allow_unsupported {
            return Err(FragmentError::UnsupportedDistro {
                distro: distro.to_string(),
            });
        }
        tracing::warn!(
            distro = %distro,
            "Unsupported distro, skipping package-manager specific directives"
        );
    }

    let mut fragment = Fragment::new();

    fragment.push(DirectiveBlock::new(BlockKind::Base).line(format!("FROM {distro}")))?;
    fragment.push(system_block(distro))?;
    fragment.push(user_block())?;
    fragment.push(install_block(version))?;
    fragment.push(DirectiveBlock::new(BlockKind::SctDir).env("SCT_DIR", version.sct_dir()))?;
    fragment.push(data_block())?;

    if options.needs_compilers() {
        fragment.push(compilers_block(family))?;
    }
    if options.install_tools {
        fragment.push(tools_block(distro))?;
    }
    if options.install_fsleyes {
        fragment.push(fsleyes_deps_block(distro))?;
    }
    if options.install_fsl {
        fragment.push(fsl_deps_block(family))?;
    }
    if options.install_fsleyes {
        fragment.push(
            DirectiveBlock::new(BlockKind::Fsleyes)
                .run(r#"bash -i -c "$SCT_DIR/python/bin/pip install fsleyes""#),
        )?;
    }
    if options.install_fsl {
        fragment.push(fsl_block())?;
    }

    fragment.push(commands_block(&options.commands))?;

    if options.configure_ssh {
        if !family.is_debian_like() {
            fragment.push(
                DirectiveBlock::new(BlockKind::SshHostKey)
                    .run("yes '' | sudo ssh-keygen -q -t ed25519 -f /etc/ssh/ssh_host_ed25519_key"),
            )?;
        }
        fragment.push(ssh_block())?;
    }

    fragment.push(DirectiveBlock::new(BlockKind::Finished).run("echo Finished"))?;

    Ok(fragment)
}

fn system_block(distro: &Distro) -> DirectiveBlock {
    let block = DirectiveBlock::new(BlockKind::System);
    match distro.package_manager() {
        Some(PackageManager::Apt) => block
            .run("apt-get update")
            .run("apt-get install -y curl sudo")
            .comment("For conda")
            .run("apt-get install -y bzip2")
            .comment("For remote GUI access")
            .run("apt-get install -y xorg")
            .run("apt-get install -y openssh-server"),
        Some(pm @ (PackageManager::Yum | PackageManager::Dnf)) => {
            let pm = pm.command();
            block
                .run(format!("{pm} update -y"))
                .line("")
                .run(format!("{pm} install -y curl sudo"))
                .comment("For conda")
                .run(format!("{pm} install -y bzip2"))
                .comment("For remote GUI access")
                .run(format!("{pm} install -y xorg-x11-twm xorg-x11-xauth"))
                .run(format!("{pm} install -y openssh-server"))
                .comment("For SCT")
                .run(format!("{pm} install -y procps findutils which"))
                .run(format!("{pm} search libstdc"))
                .run(format!("{pm} install -y compat-libstdc++-33 libstdc++"))
        }
        None => block,
    }
}

fn user_block() -> DirectiveBlock {
    DirectiveBlock::new(BlockKind::User)
        .run("useradd -ms /bin/bash sct")
        .run(r#"echo "sct ALL=(ALL) NOPASSWD: ALL" >> /etc/sudoers"#)
        .run(r#"echo "sct:sct" | chpasswd"#)
        .line("USER sct")
        .env("HOME", "/home/sct")
        .line("WORKDIR /home/sct")
        .line("EXPOSE 22")
}

fn install_block(version: &SctVersion) -> DirectiveBlock {
    let dir = version.source_dir_pattern();
    DirectiveBlock::new(BlockKind::Install).run(format!(
        "curl --location {} | gunzip | tar x && cd {dir} && yes | ./install_sct && cd - && rm -rf {dir}",
        version.archive_url()
    ))
}

fn data_block() -> DirectiveBlock {
    DirectiveBlock::new(BlockKind::Data)
        .comment("Get data for offline use")
        .run(r#"bash -i -c "sct_download_data -d sct_example_data""#)
        .run(r#"bash -i -c "sct_download_data -d sct_testing_data""#)
}

// Keyed on the family rather than the base package manager: every CentOS
// release gets the yum line here, including the ones set up with dnf.
fn compilers_block(family: DistroFamily) -> DirectiveBlock {
    let block = DirectiveBlock::new(BlockKind::Compilers);
    match family {
        DistroFamily::DebianLike => block
            .run("sudo apt-get update")
            .run("sudo apt-get install -y build-essential"),
        DistroFamily::RpmLike(RpmFlavor::Fedora) => block
            .comment(r#"sudo dnf groupinstall -y "Development Tools""#)
            .run(r#"sudo dnf install -y redhat-rpm-config gcc "gcc-c++""#),
        DistroFamily::RpmLike(RpmFlavor::CentOs) => {
            block.run(r#"sudo yum install -y redhat-rpm-config gcc "gcc-c++" make"#)
        }
        DistroFamily::Unsupported => block,
    }
}

fn tools_block(distro: &Distro) -> DirectiveBlock {
    let block = DirectiveBlock::new(BlockKind::Tools);
    match distro.package_manager() {
        Some(PackageManager::Apt) => block
            .run("sudo apt-get update")
            .run("sudo apt-get install -y git wget unzip"),
        Some(pm) => block.run(format!("sudo {} install -y git wget unzip", pm.command())),
        None => block,
    }
}

fn fsleyes_deps_block(distro: &Distro) -> DirectiveBlock {
    let block = DirectiveBlock::new(BlockKind::FsleyesDeps);
    match distro.family() {
        DistroFamily::DebianLike if distro.is("debian:7") => block
            .run("sudo apt-get install -y libgtkmm-3.0-dev libgtkglext1-dev libgtk-3-dev")
            .run("sudo apt-get install -y libgstreamer0.10-dev libgstreamer-plugins-base0.10-dev")
            .run("sudo apt-get install -y libwebkitgtk-3.0-dev libwebkitgtk-dev"),
        DistroFamily::DebianLike => block
            .run("sudo apt-get install -y libgtkmm-3.0-dev libgtkglext1-dev")
            .run("sudo apt-get install -y libgstreamer1.0-dev libgstreamer-plugins-base1.0-dev")
            .run("sudo apt-get install -y libwebkitgtk-3.0-dev libwebkitgtk-dev"),
        DistroFamily::RpmLike(RpmFlavor::Fedora) => {
            let webkit = if distro.is("fedora:27") {
                "webkitgtk4-devel"
            } else {
                "webkitgtk3-devel webkitgtk-devel"
            };
            block
                .run("sudo dnf install -y gtkmm30-devel gtkglext-devel")
                .run("sudo dnf install -y gstreamer1-devel gstreamer1-plugins-base-devel")
                .run(format!("sudo dnf install -y {webkit}"))
        }
        DistroFamily::RpmLike(RpmFlavor::CentOs) => block
            .run("sudo yum install -y gtkmm30-devel gtkglext-devel freeglut-devel")
            .run("sudo yum install -y gstreamer1-devel gstreamer1-plugins-base-devel")
            .run("sudo yum install -y webkitgtk3-devel webkitgtk-devel"),
        DistroFamily::Unsupported => block,
    }
}

fn fsl_deps_block(family: DistroFamily) -> DirectiveBlock {
    let block = DirectiveBlock::new(BlockKind::FslDeps);
    match family {
        DistroFamily::DebianLike => block
            .run("sudo apt-get install -y libexpat1-dev libx11-dev zlib1g-dev libgl1-mesa-dev"),
        DistroFamily::RpmLike(flavor) => {
            let pm = match flavor {
                RpmFlavor::Fedora => "dnf",
                RpmFlavor::CentOs => "yum",
            };
            block.run(format!(
                "sudo {pm} install -y expat-devel libX11-devel mesa-libGL-devel zlib-devel"
            ))
        }
        DistroFamily::Unsupported => block,
    }
}

fn fsl_block() -> DirectiveBlock {
    const FSL_SH: &str = ". ${FSLDIR}/etc/fslconf/fsl.sh";
    DirectiveBlock::new(BlockKind::Fsl)
        .run(r#"bash -c "curl https://fsl.fmrib.ox.ac.uk/fsldownloads/fsl-5.0.11-sources.tar.gz | gunzip | tar x""#)
        .env("FSLDIR", "/home/sct/fsl")
        .run(format!(r#"bash -c "{FSL_SH}; ls ${{FSLDIR}}/config/\${{FSLMACHTYPE}}""#))
        .run(format!(r#"bash -c "{FSL_SH}; cd ${{FSLDIR}}; ./build""#))
        .run(format!(
            r#"bash -c "{FSL_SH}; ${{FSLDIR}}/etc/fslconf/post_install.sh -f ${{FSLDIR}}""#
        ))
        .run(format!(
            r#"bash -c "{FSL_SH}; ${{FSLDIR}}/etc/fslconf/fslpython_install.sh""#
        ))
        .run(format!(
            r#"bash -c "echo -ne '{FSL_SH}; PATH+=:${{FSLDIR}}/bin\n\n' >> ~/.bashrc""#
        ))
        .run(r#"bash -c "cat ~/.bashrc""#)
}

fn commands_block(commands: &[String]) -> DirectiveBlock {
    commands
        .iter()
        .fold(DirectiveBlock::new(BlockKind::Commands), |block, command| {
            block.run(format!("bash -i -c {}", shell_words::quote(command)))
        })
}

fn ssh_block() -> DirectiveBlock {
    DirectiveBlock::new(BlockKind::Ssh)
        .comment("QC connection")
        .line("EXPOSE 8888")
        .line("")
        .run("echo  X11UseLocalhost no | sudo tee --append /etc/ssh/sshd_config")
        .line("")
        .line("ENTRYPOINT bash -c 'sudo /usr/sbin/sshd; /bin/bash'")
}
