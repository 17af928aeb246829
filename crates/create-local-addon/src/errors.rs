//! Runtime errors surfaced by the binary.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to determine the working directory")]
    WorkingDirectory(#[source] io::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to write the summary")]
    Report(#[source] io::Error),
}

/// Renders an error and its causes on one line, for log fields.
pub(crate) struct ErrorChain<'a>(pub(crate) &'a (dyn StdError + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut cause = self.0.source();
        while let Some(inner) = cause {
            write!(f, ": {inner}")?;
            cause = inner.source();
        }
        Ok(())
    }
}
