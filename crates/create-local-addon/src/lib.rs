//! Scaffolds add-ons for the Local desktop application.
//!
//! The crate downloads the upstream add-on boilerplate, negotiates a unique
//! name for it against the add-ons already installed, writes it next to the
//! caller or straight into the host, and then links, builds and enables it.
//! [`run`] is the entry point used by the binary; the pipeline and its
//! collaborators are public so they can be driven with other transports,
//! prompters and build runners.

pub mod activation;
mod cli;
mod errors;
pub mod fetch;
pub mod host;
pub mod manifest;
pub mod naming;
pub mod pipeline;
pub mod placement;
pub mod telemetry;

#[cfg(test)]
mod tests;

use std::error::Error as _;
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use addon_config::Config;
use clap::Parser;
use clap::error::ErrorKind;

use crate::activation::{BuildOutcome, BuildRunner, EnableOutcome, LinkOutcome, NpmBuildRunner};
use crate::cli::Cli;
use crate::errors::AppError;
use crate::fetch::{ArchiveTransport, HttpTransport};
use crate::naming::StdioPrompter;
use crate::pipeline::{Completion, Invocation, Pipeline};

const TRACE_HINT: &str = "re-run with --show-error-traces for more detail";

/// Runs the scaffolder with the given arguments and streams.
///
/// Prompts are written to `stdout` and answered from `stdin`. Usage errors
/// and fatal failures go to `stderr`.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with(
        args,
        stdin,
        stdout,
        stderr,
        &HttpTransport::new(),
        &NpmBuildRunner::new(),
    )
}

/// Runs the scaffolder with explicit download and build collaborators.
pub(crate) fn run_with<I, R, W, E>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    transport: &dyn ArchiveTransport,
    builder: &dyn BuildRunner,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(error, stdout, stderr),
    };
    let config = cli.to_config();

    let result = execute(cli, &config, stdin, stdout, transport, builder);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error, config.show_error_traces, stderr);
            ExitCode::FAILURE
        }
    }
}

fn execute<R: BufRead, W: Write>(
    cli: Cli,
    config: &Config,
    stdin: R,
    stdout: &mut W,
    transport: &dyn ArchiveTransport,
    builder: &dyn BuildRunner,
) -> Result<(), AppError> {
    telemetry::initialise(config)?;
    let working_dir = std::env::current_dir().map_err(AppError::WorkingDirectory)?;
    let invocation = Invocation {
        product_name: cli.product_name,
        directory_name: cli.directory_name,
        working_dir,
    };

    let completion = {
        let mut prompter = StdioPrompter::new(stdin, &mut *stdout);
        Pipeline::new(config, invocation, &mut prompter, transport, builder).run()?
    };
    write_summary(stdout, &completion, config).map_err(AppError::Report)
}

/// Help and version output are successful runs; anything else clap rejects
/// is a usage error.
fn report_usage<W: Write, E: Write>(error: clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode {
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        let _ = write!(stdout, "{}", error.render());
        return ExitCode::SUCCESS;
    }
    let _ = write!(stderr, "{}", AppError::CliUsage(error));
    ExitCode::FAILURE
}

fn report_error<E: Write>(error: &AppError, show_traces: bool, stderr: &mut E) {
    let _ = writeln!(stderr, "error: {error}");
    if show_traces {
        let mut cause = error.source();
        while let Some(inner) = cause {
            let _ = writeln!(stderr, "  caused by: {inner}");
            cause = inner.source();
        }
    } else if error.source().is_some() {
        let _ = writeln!(stderr, "{TRACE_HINT}");
    }
}

fn write_summary<W: Write>(
    out: &mut W,
    completion: &Completion,
    config: &Config,
) -> std::io::Result<()> {
    let path = completion.addon_path.display();
    writeln!(out)?;
    writeln!(
        out,
        "Created add-on \"{}\" in {path}",
        completion.names.display_name
    )?;
    writeln!(out, "  host: {}", completion.host.variant())?;
    writeln!(out, "  placement: {}", completion.placement.mode)?;
    if let LinkOutcome::Created(link) = &completion.activation.link {
        writeln!(out, "  linked at: {}", link.display())?;
    }

    writeln!(out)?;
    writeln!(out, "Next steps:")?;
    if let LinkOutcome::Unavailable(link) = &completion.activation.link {
        writeln!(
            out,
            "  - link {} to {path} so Local can find the add-on",
            link.display()
        )?;
    }
    match completion.activation.build {
        BuildOutcome::Succeeded => {}
        BuildOutcome::Skipped | BuildOutcome::Failed(_) => {
            writeln!(out, "  - cd \"{path}\" && npm install && npm run build")?;
        }
    }
    if !config.should_enable() || completion.activation.enable == EnableOutcome::Failed {
        writeln!(out, "  - enable the add-on from Local's Add-ons page")?;
    }
    writeln!(
        out,
        "  - restart {} to load the add-on",
        completion.host.variant()
    )?;
    Ok(())
}
