//! Console bootstrap orchestration.
//!
//! Configuration and telemetry failures are fatal. A record store that
//! cannot be opened is not: the console reports it and carries on with an
//! in-memory store so navigation keeps working.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use poortego_config::Config;
use thiserror::Error;
use tracing::warn;

use crate::driver::{Driver, Settings};
use crate::health::{HealthReporter, LIFECYCLE_TARGET};
use crate::store::{Persistence, RecordStore, StoreError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader {
    /// Loads configuration from the configuration flags in `args`.
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers defaults, file, environment and flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(args.iter().cloned())
    }
}

/// Loader that always yields the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a fixed configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap.
pub struct Console {
    config: Config,
    driver: Driver,
    telemetry: TelemetryHandle,
    degraded: Option<StoreError>,
}

impl Console {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Store failure that forced the in-memory fallback, if any.
    #[must_use]
    pub fn degraded(&self) -> Option<&StoreError> {
        self.degraded.as_ref()
    }

    /// Splits the console into its configuration and driver.
    #[must_use]
    pub fn into_parts(self) -> (Config, Driver, Option<StoreError>) {
        (self.config, self.driver, self.degraded)
    }
}

/// Bootstraps the console using the supplied collaborators.
///
/// # Errors
///
/// Returns an error when configuration or telemetry cannot be initialised.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    config_arguments: &[OsString],
    reporter: &dyn HealthReporter,
) -> Result<Console, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load(config_arguments) {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let (store, degraded) = open_store(&config, reporter);
    let mut driver = Driver::new(Arc::new(store), Settings::from_config(&config));
    start_autosave(&mut driver, &config, reporter);
    reporter.bootstrap_succeeded(&config);

    Ok(Console {
        config,
        driver,
        telemetry,
        degraded,
    })
}

fn open_store(config: &Config, reporter: &dyn HealthReporter) -> (RecordStore, Option<StoreError>) {
    let Some(path) = config.store_path() else {
        reporter.store_ready(None);
        return (RecordStore::in_memory(), None);
    };
    match RecordStore::open(path.clone()) {
        Ok(store) => {
            reporter.store_ready(store.location());
            (store, None)
        }
        Err(error) => {
            reporter.store_degraded(&error);
            (RecordStore::in_memory(), Some(error))
        }
    }
}

/// Starts the protected job that periodically flushes a file-backed store.
fn start_autosave(driver: &mut Driver, config: &Config, reporter: &dyn HealthReporter) {
    if config.autosave_secs() == 0 || driver.store().location().is_none() {
        return;
    }
    let store = driver.store_handle();
    let interval = Duration::from_secs(config.autosave_secs());
    let spawned = driver.jobs_mut().spawn(config.protected_job(), move |cancel| {
        while !cancel.sleep(interval) {
            if let Err(error) = store.flush() {
                warn!(target: LIFECYCLE_TARGET, %error, "autosave flush failed");
            }
        }
    });
    if let Err(error) = spawned {
        reporter.autosave_failed(&error);
    }
}
