//! Failures that end a run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::activation::ActivationError;
use crate::fetch::FetchError;
use crate::manifest::ManifestError;
use crate::naming::PromptError;

/// Broad class of a fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Nothing to install into.
    FatalEnvironment,
    /// An I/O step failed after the run started.
    FatalIo,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FatalEnvironment => "environment",
            Self::FatalIo => "io",
        })
    }
}

/// Errors that stop the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The platform has no application-support directory.
    #[error("could not determine the application support directory on this platform")]
    NoApplicationSupport,
    /// No host variant is installed.
    #[error(
        "no Local installation found under '{}'; install Local and run it once first",
        searched.display()
    )]
    NoInstallation {
        /// Directory that was searched.
        searched: PathBuf,
    },
    /// Name negotiation could not read an answer.
    #[error(transparent)]
    Prompt(#[from] PromptError),
    /// The boilerplate could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The manifest could not be updated.
    #[error("failed to update the add-on manifest; the add-on directory was kept")]
    Manifest(#[source] ManifestError),
    /// The add-on could not be linked into the host.
    #[error("failed to link the add-on into Local; the add-on directory was kept")]
    Activation(#[source] ActivationError),
}

impl PipelineError {
    /// Classifies the failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NoApplicationSupport | Self::NoInstallation { .. } => {
                ErrorClass::FatalEnvironment
            }
            Self::Prompt(_) | Self::Fetch(_) | Self::Manifest(_) | Self::Activation(_) => {
                ErrorClass::FatalIo
            }
        }
    }
}

impl From<ManifestError> for PipelineError {
    fn from(error: ManifestError) -> Self {
        Self::Manifest(error)
    }
}

impl From<ActivationError> for PipelineError {
    fn from(error: ActivationError) -> Self {
        Self::Activation(error)
    }
}
