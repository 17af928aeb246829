//! Linking, building and enabling the new add-on.
//!
//! Each step can fail on its own. Only a link failure on a platform that is
//! expected to support links aborts activation; everything else is recorded
//! in the [`ActivationOutcome`] and logged.

mod build;
mod registry;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

pub use self::build::{BuildError, BuildRunner, BuildStep, NpmBuildRunner};
pub use self::registry::{RegistryError, enable_addon};
use crate::errors::ErrorChain;
use crate::host::HostInstallation;

const ACTIVATION_TARGET: &str = "create_local_addon::activation";

/// Errors raised while activating an add-on.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The link into the host's add-ons directory could not be created.
    #[error("failed to link '{}' to '{}'", link.display(), target.display())]
    Symlink {
        /// Link location inside the host.
        link: PathBuf,
        /// Add-on directory the link points at.
        target: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The enabled-add-ons registry could not be updated.
    #[error("failed to update enabled add-ons '{}'", path.display())]
    Registry {
        /// Registry file.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: RegistryError,
    },
}

/// Inputs to [`activate`].
#[derive(Debug, Clone, Copy)]
pub struct ActivationRequest<'a> {
    /// Installation the add-on is registered with.
    pub host: &'a HostInstallation,
    /// Directory holding the add-on's files.
    pub addon_path: &'a Path,
    /// Directory name the host knows the add-on by.
    pub directory_name: &'a str,
    /// Whether to link the add-on into the host's add-ons directory.
    pub create_link: bool,
    /// Whether to build the add-on and mark it enabled.
    pub enable: bool,
}

/// What happened to the link step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// No link was requested.
    NotRequested,
    /// The link was created at this path.
    Created(PathBuf),
    /// Linking is unavailable here; the add-on must be linked by hand.
    Unavailable(PathBuf),
}

/// What happened to the build chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Building was disabled.
    Skipped,
    /// Every build step succeeded.
    Succeeded,
    /// A step failed; later steps did not run.
    Failed(BuildStep),
}

/// What happened to the enabled-add-ons registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnableOutcome {
    /// Enabling was disabled.
    Skipped,
    /// The add-on was marked enabled.
    Enabled,
    /// The registry could not be updated.
    Failed,
}

/// Summary of a completed activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// Link step result.
    pub link: LinkOutcome,
    /// Build step result.
    pub build: BuildOutcome,
    /// Registry step result.
    pub enable: EnableOutcome,
}

impl ActivationOutcome {
    /// Whether any step ended with a warning or error.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self.link, LinkOutcome::Unavailable(_))
            || matches!(self.build, BuildOutcome::Failed(_))
            || self.enable == EnableOutcome::Failed
    }
}

/// Links, builds and enables the add-on as requested.
///
/// # Errors
///
/// Returns [`ActivationError::Symlink`] when the link cannot be created on a
/// platform where links are expected to work. Build and registry failures are
/// reported through the returned [`ActivationOutcome`] instead.
pub fn activate<B>(
    request: &ActivationRequest<'_>,
    runner: &B,
) -> Result<ActivationOutcome, ActivationError>
where
    B: BuildRunner + ?Sized,
{
    let link = if request.create_link {
        link_into_host(request)?
    } else {
        LinkOutcome::NotRequested
    };

    let (build, enable) = if request.enable {
        (run_build(runner, request.addon_path), enable_in_host(request))
    } else {
        info!(target: ACTIVATION_TARGET, "build and enable disabled");
        (BuildOutcome::Skipped, EnableOutcome::Skipped)
    };

    Ok(ActivationOutcome {
        link,
        build,
        enable,
    })
}

fn link_into_host(request: &ActivationRequest<'_>) -> Result<LinkOutcome, ActivationError> {
    let addons_dir = request.host.addons_dir();
    let link = addons_dir.join(request.directory_name);
    let result = fs::create_dir_all(&addons_dir)
        .and_then(|()| symlink_dir(request.addon_path, &link));

    match result {
        Ok(()) => {
            info!(
                target: ACTIVATION_TARGET,
                link = %link.display(),
                target_dir = %request.addon_path.display(),
                "linked add-on into host"
            );
            Ok(LinkOutcome::Created(link))
        }
        Err(source) if link_failure_is_recoverable(&source, cfg!(windows)) => {
            warn!(
                target: ACTIVATION_TARGET,
                link = %link.display(),
                error = %ErrorChain(&source),
                "could not create a link on this platform; link the add-on manually"
            );
            Ok(LinkOutcome::Unavailable(link))
        }
        Err(source) => Err(ActivationError::Symlink {
            link,
            target: request.addon_path.to_path_buf(),
            source,
        }),
    }
}

fn run_build<B: BuildRunner + ?Sized>(runner: &B, addon_path: &Path) -> BuildOutcome {
    for step in BuildStep::SEQUENCE {
        if let Err(failure) = runner.run_step(addon_path, step) {
            warn!(
                target: ACTIVATION_TARGET,
                %step,
                error = %ErrorChain(&failure),
                "build failed; the add-on directory was still created"
            );
            return BuildOutcome::Failed(step);
        }
    }
    BuildOutcome::Succeeded
}

fn enable_in_host(request: &ActivationRequest<'_>) -> EnableOutcome {
    let path = request.host.enabled_addons_path();
    match enable_addon(&path, request.directory_name) {
        Ok(()) => EnableOutcome::Enabled,
        Err(source) => {
            let failure = ActivationError::Registry { path, source };
            error!(
                target: ACTIVATION_TARGET,
                error = %ErrorChain(&failure),
                "could not enable add-on"
            );
            EnableOutcome::Failed
        }
    }
}

/// Windows needs elevated rights or developer mode for links, and some
/// platforms have none at all.
fn link_failure_is_recoverable(error: &io::Error, links_need_privileges: bool) -> bool {
    links_need_privileges || error.kind() == io::ErrorKind::Unsupported
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests;
