//! Command-line arguments.

use std::path::PathBuf;

use addon_config::{
    APP_SUPPORT_DIR_ENV, ARCHIVE_ROOT_ENV, ARCHIVE_URL_ENV, Config, DEFAULT_ARCHIVE_ROOT,
    DEFAULT_ARCHIVE_URL, LOG_FILTER_ENV, LOG_FORMAT_ENV, LogFormat,
};
use clap::Parser;

/// Scaffolds a new Local add-on from the official boilerplate.
///
/// Downloads the boilerplate, names it, and registers it with an installed
/// copy of Local (stable or Beta).
#[derive(Parser, Debug)]
#[command(name = "create-local-addon", version)]
pub(crate) struct Cli {
    /// Product name shown inside Local; prompted for when omitted.
    #[arg(value_name = "PRODUCT_NAME")]
    pub(crate) product_name: Option<String>,
    /// Directory name for the add-on; prompted for when omitted.
    #[arg(value_name = "DIRECTORY_NAME")]
    pub(crate) directory_name: Option<String>,
    /// Prefers Local Beta when both variants are installed.
    #[arg(long)]
    pub(crate) beta: bool,
    /// Creates the add-on inside Local's add-ons directory (implies
    /// --do-not-symlink).
    #[arg(long)]
    pub(crate) place_directly: bool,
    /// Does not link the add-on into Local's add-ons directory.
    #[arg(long)]
    pub(crate) do_not_symlink: bool,
    /// Skips building and enabling the add-on.
    #[arg(long)]
    pub(crate) disable: bool,
    /// Prints progress information.
    #[arg(long)]
    pub(crate) verbose: bool,
    /// Prints the full cause chain when something fails.
    #[arg(long)]
    pub(crate) show_error_traces: bool,
    /// Boilerplate archive to download.
    #[arg(long, env = ARCHIVE_URL_ENV, default_value = DEFAULT_ARCHIVE_URL, value_name = "URL")]
    pub(crate) archive_url: String,
    /// Top-level folder inside the boilerplate archive.
    #[arg(long, env = ARCHIVE_ROOT_ENV, default_value = DEFAULT_ARCHIVE_ROOT, value_name = "NAME")]
    pub(crate) archive_root: String,
    /// Directory containing Local's per-variant data folders.
    #[arg(long, env = APP_SUPPORT_DIR_ENV, value_name = "DIR")]
    pub(crate) app_support_dir: Option<PathBuf>,
    /// Tracing filter expression (defaults to `info` with --verbose, `warn`
    /// otherwise).
    #[arg(long, env = LOG_FILTER_ENV, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Log output format: `compact` or `json`.
    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Compact, value_name = "FORMAT")]
    pub(crate) log_format: LogFormat,
}

impl Cli {
    /// Resolves the flags into a normalised [`Config`].
    pub(crate) fn to_config(&self) -> Config {
        Config {
            prefer_beta: self.beta,
            place_directly: self.place_directly,
            do_not_symlink: self.do_not_symlink,
            disable: self.disable,
            verbose: self.verbose,
            show_error_traces: self.show_error_traces,
            archive_url: self.archive_url.clone(),
            archive_root: self.archive_root.clone(),
            app_support_dir: self.app_support_dir.clone(),
            log_filter: self.log_filter.clone(),
            log_format: self.log_format,
        }
        .normalised()
    }
}
