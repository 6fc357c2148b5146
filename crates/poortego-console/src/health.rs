//! Structured health reporting for console lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;
use poortego_config::Config;

use crate::bootstrap::BootstrapError;
use crate::jobs::JobError;
use crate::store::StoreError;

/// Tracing target for lifecycle events.
pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the record store is open. `None` means memory only.
    fn store_ready(&self, location: Option<&Utf8Path>);

    /// Invoked when the configured store could not be opened and the console
    /// fell back to an in-memory store.
    fn store_degraded(&self, error: &StoreError);

    /// Invoked when the autosave job could not be started.
    fn autosave_failed(&self, error: &JobError);

    /// Invoked after the input loop has ended and jobs were shut down.
    fn console_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn store_ready(&self, location: Option<&Utf8Path>) {
        (**self).store_ready(location);
    }

    fn store_degraded(&self, error: &StoreError) {
        (**self).store_degraded(error);
    }

    fn autosave_failed(&self, error: &JobError) {
        (**self).autosave_failed(error);
    }

    fn console_stopped(&self) {
        (**self).console_stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_starting",
            "starting console bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_succeeded",
            store = ?config.store_path(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "console bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "console bootstrap failed"
        );
    }

    fn store_ready(&self, location: Option<&Utf8Path>) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "store_ready",
            location = location.map_or("memory", Utf8Path::as_str),
            "record store ready"
        );
    }

    fn store_degraded(&self, error: &StoreError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "store_degraded",
            error = %error,
            "record store unavailable; continuing in memory"
        );
    }

    fn autosave_failed(&self, error: &JobError) {
        tracing::warn!(
            target: LIFECYCLE_TARGET,
            event = "autosave_failed",
            error = %error,
            "autosave job did not start"
        );
    }

    fn console_stopped(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "console_stopped",
            "console stopped"
        );
    }
}
