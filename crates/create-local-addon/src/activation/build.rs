//! Package installation and build of the new add-on.
//!
//! [`BuildRunner`] abstracts the subprocess so tests can script outcomes
//! without a package manager on the machine. [`NpmBuildRunner`] is the
//! production implementation.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info};

const BUILD_TARGET: &str = "create_local_addon::activation::build";

#[cfg(windows)]
const DEFAULT_PROGRAM: &str = "npm.cmd";
#[cfg(not(windows))]
const DEFAULT_PROGRAM: &str = "npm";

/// One subprocess of the build chain, run in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// Installs the add-on's package dependencies.
    Install,
    /// Runs the add-on's build script.
    Build,
}

impl BuildStep {
    /// Steps in execution order.
    pub const SEQUENCE: [Self; 2] = [Self::Install, Self::Build];

    /// Arguments passed to the package manager for this step.
    #[must_use]
    pub const fn args(self) -> &'static [&'static str] {
        match self {
            Self::Install => &["install"],
            Self::Build => &["run", "build"],
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Build => "build",
        })
    }
}

/// Errors raised by a build step.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The package manager could not be started.
    #[error("failed to start '{program}' for the {step} step")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Step being run.
        step: BuildStep,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The package manager exited unsuccessfully.
    #[error("'{program}' {step} step exited with {status}")]
    Failed {
        /// Program that was invoked.
        program: String,
        /// Step being run.
        step: BuildStep,
        /// Exit status reported by the process.
        status: ExitStatus,
    },
}

/// Runs build steps inside an add-on directory.
pub trait BuildRunner {
    /// Runs `step` with `directory` as the working directory, blocking until
    /// the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the process cannot be started or exits
    /// unsuccessfully.
    fn run_step(&self, directory: &Path, step: BuildStep) -> Result<(), BuildError>;
}

/// Runs build steps through the `npm` command line.
///
/// The child inherits stdout and stderr so the package manager's progress
/// stays visible; stdin is closed.
#[derive(Debug, Clone)]
pub struct NpmBuildRunner {
    program: OsString,
}

impl NpmBuildRunner {
    /// Uses the platform's `npm` executable from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Uses `program` in place of `npm`.
    #[must_use]
    pub fn with_program(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Default for NpmBuildRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildRunner for NpmBuildRunner {
    fn run_step(&self, directory: &Path, step: BuildStep) -> Result<(), BuildError> {
        debug!(
            target: BUILD_TARGET,
            program = %self.program_name(),
            args = ?step.args(),
            directory = %directory.display(),
            "spawning build step"
        );
        let status = Command::new(&self.program)
            .args(step.args())
            .current_dir(directory)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.program_name(),
                step,
                source,
            })?;
        if !status.success() {
            return Err(BuildError::Failed {
                program: self.program_name(),
                step,
                status,
            });
        }
        info!(target: BUILD_TARGET, %step, "build step finished");
        Ok(())
    }
}
