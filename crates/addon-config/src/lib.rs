//! Shared configuration for the `create-local-addon` scaffolder.
//!
//! [`Config`] is the resolved form of the command-line flags and their
//! environment overrides. The pipeline only ever reads it; the derived policy
//! helpers ([`Config::should_symlink`], [`Config::should_enable`],
//! [`Config::log_filter`]) keep flag interactions in one place.

mod defaults;
mod logging;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use defaults::{
    APP_SUPPORT_DIR_ENV, ARCHIVE_ROOT_ENV, ARCHIVE_URL_ENV, DEFAULT_ARCHIVE_ROOT,
    DEFAULT_ARCHIVE_URL, LOG_FILTER_ENV, LOG_FORMAT_ENV, QUIET_LOG_FILTER, VERBOSE_LOG_FILTER,
    default_archive_root, default_archive_url, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Prefer the Beta host variant when both are installed.
    #[serde(default)]
    pub prefer_beta: bool,
    /// Write the add-on straight into the host's add-ons directory.
    #[serde(default)]
    pub place_directly: bool,
    /// Skip creating the link inside the host's add-ons directory.
    #[serde(default)]
    pub do_not_symlink: bool,
    /// Skip building and enabling the add-on.
    #[serde(default)]
    pub disable: bool,
    /// Emit informational progress events.
    #[serde(default)]
    pub verbose: bool,
    /// Print the full error chain on failure.
    #[serde(default)]
    pub show_error_traces: bool,
    /// Boilerplate archive location.
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// Name of the archive's single top-level folder.
    #[serde(default = "default_archive_root")]
    pub archive_root: String,
    /// Overrides the per-OS application-support directory.
    #[serde(default)]
    pub app_support_dir: Option<PathBuf>,
    /// Explicit tracing filter; derived from `verbose` when absent.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Output format for log events.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefer_beta: false,
            place_directly: false,
            do_not_symlink: false,
            disable: false,
            verbose: false,
            show_error_traces: false,
            archive_url: default_archive_url(),
            archive_root: default_archive_root(),
            app_support_dir: None,
            log_filter: None,
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Applies flag implications: placing directly never links.
    #[must_use]
    pub fn normalised(mut self) -> Self {
        if self.place_directly {
            self.do_not_symlink = true;
        }
        self
    }

    /// Whether the link step runs for symlinked placements.
    #[must_use]
    pub const fn should_symlink(&self) -> bool {
        !self.do_not_symlink && !self.place_directly
    }

    /// Whether the build and enable steps run.
    #[must_use]
    pub const fn should_enable(&self) -> bool {
        !self.disable
    }

    /// Tracing filter expression in effect.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        match self.log_filter.as_deref() {
            Some(filter) => filter,
            None if self.verbose => VERBOSE_LOG_FILTER,
            None => QUIET_LOG_FILTER,
        }
    }

    /// Logging output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Application-support override, if configured.
    #[must_use]
    pub fn app_support_dir(&self) -> Option<&Path> {
        self.app_support_dir.as_deref()
    }
}
