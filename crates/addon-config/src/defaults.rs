use crate::logging::LogFormat;

/// Boilerplate archive fetched when no override is configured.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/getflywheel/local-addon-boilerplate/archive/master.tar.gz";

/// Top-level folder inside [`DEFAULT_ARCHIVE_URL`].
pub const DEFAULT_ARCHIVE_ROOT: &str = "local-addon-boilerplate-master";

/// Log filter used when `--verbose` is set.
pub const VERBOSE_LOG_FILTER: &str = "info";

/// Log filter used otherwise; warnings and errors only.
pub const QUIET_LOG_FILTER: &str = "warn";

/// Environment variable overriding the archive URL.
pub const ARCHIVE_URL_ENV: &str = "CREATE_LOCAL_ADDON_ARCHIVE_URL";

/// Environment variable overriding the archive root folder name.
pub const ARCHIVE_ROOT_ENV: &str = "CREATE_LOCAL_ADDON_ARCHIVE_ROOT";

/// Environment variable overriding the application-support base directory.
pub const APP_SUPPORT_DIR_ENV: &str = "CREATE_LOCAL_ADDON_APP_SUPPORT_DIR";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "CREATE_LOCAL_ADDON_LOG_FILTER";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "CREATE_LOCAL_ADDON_LOG_FORMAT";

/// Owned archive URL used where allocation is required.
pub fn default_archive_url() -> String {
    DEFAULT_ARCHIVE_URL.to_owned()
}

/// Owned archive root used where allocation is required.
pub fn default_archive_root() -> String {
    DEFAULT_ARCHIVE_ROOT.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
