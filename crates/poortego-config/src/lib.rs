//! Shared configuration for the poortego console.
//!
//! Values are layered by `ortho_config`: built-in defaults, then the optional
//! configuration file (`--config-path` or `POORTEGO_CONFIG_PATH`), then
//! `POORTEGO_*` environment variables, and finally command-line flags.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_AUTOSAVE_SECS, DEFAULT_LOG_FILTER, DEFAULT_ONLINE_WINDOW_SECS, DEFAULT_PROTECTED_JOB,
    default_autosave_secs, default_history_path, default_log_filter, default_log_filter_string,
    default_log_format, default_online_window_secs, default_protected_job,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "POORTEGO")]
pub struct Config {
    /// Tracing filter expression applied to console telemetry.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format used by the telemetry subscriber.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// JSON snapshot backing the record store. Records stay in memory when unset.
    #[serde(default)]
    pub store_path: Option<Utf8PathBuf>,
    /// Line editor history file.
    #[serde(default = "default_history_path")]
    pub history_path: Option<Utf8PathBuf>,
    /// Job name that `jobs -k` refuses to terminate.
    #[serde(default = "default_protected_job")]
    pub protected_job: String,
    /// Entities seen within this many seconds are considered online.
    #[serde(default = "default_online_window_secs")]
    pub online_window_secs: u64,
    /// Interval between background store flushes; zero disables autosave.
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            store_path: None,
            history_path: default_history_path(),
            protected_job: default_protected_job(),
            online_window_secs: default_online_window_secs(),
            autosave_secs: default_autosave_secs(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Location of the store snapshot, if persistence is enabled.
    #[must_use]
    pub fn store_path(&self) -> Option<&Utf8PathBuf> {
        self.store_path.as_ref()
    }

    /// Location of the line editor history, if any.
    #[must_use]
    pub fn history_path(&self) -> Option<&Utf8PathBuf> {
        self.history_path.as_ref()
    }

    /// Name of the job shielded from `jobs -k`.
    #[must_use]
    pub fn protected_job(&self) -> &str {
        self.protected_job.as_str()
    }

    /// Reachability window in seconds.
    #[must_use]
    pub fn online_window_secs(&self) -> u64 {
        self.online_window_secs
    }

    /// Autosave interval in seconds.
    #[must_use]
    pub fn autosave_secs(&self) -> u64 {
        self.autosave_secs
    }
}
