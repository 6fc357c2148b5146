use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression. Kept quiet so telemetry does not interleave
/// with the interactive prompt.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Name of the background job that flushes the record store.
pub const DEFAULT_PROTECTED_JOB: &str = "store_sync";

/// Seconds after which an entity stops being reported as online.
pub const DEFAULT_ONLINE_WINDOW_SECS: u64 = 30;

/// Seconds between background store flushes.
pub const DEFAULT_AUTOSAVE_SECS: u64 = 60;

/// Default log filter expression used by the console.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the console.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default protected job name.
pub fn default_protected_job() -> String {
    DEFAULT_PROTECTED_JOB.to_string()
}

/// Default reachability window.
pub fn default_online_window_secs() -> u64 {
    DEFAULT_ONLINE_WINDOW_SECS
}

/// Default autosave interval.
pub fn default_autosave_secs() -> u64 {
    DEFAULT_AUTOSAVE_SECS
}

/// History lives under the platform data directory when one is known.
pub fn default_history_path() -> Option<Utf8PathBuf> {
    let mut base = dirs::data_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())?;
    base.push("poortego");
    base.push("history");
    Some(base)
}
