//! Shared helpers for the console test suites.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::Utf8Path;
use poortego_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::RouteOutcome;
use crate::driver::{Driver, Settings};
use crate::health::HealthReporter;
use crate::interface::now_unix;
use crate::jobs::{CancelToken, JobError, JobId};
use crate::output::Output;
use crate::store::{RecordId, RecordKind, RecordStore, StoreError};

/// Builds a driver over an empty in-memory store.
pub(crate) fn driver() -> Driver {
    Driver::new(Arc::new(RecordStore::in_memory()), Settings::default())
}

/// Routes `line` and captures everything the handlers printed.
pub(crate) fn run(driver: &mut Driver, line: &str) -> (RouteOutcome, String) {
    let mut buffer = Vec::new();
    let outcome = {
        let mut output = Output::new(&mut buffer);
        driver.run_single(line, &mut output)
    };
    let text = String::from_utf8(buffer).expect("handler output is UTF-8");
    (outcome, text)
}

/// Records an entity. Online entities are stamped as seen now; offline ones
/// were last seen an hour ago.
pub(crate) fn seed_entity(driver: &Driver, name: &str, address: &str, online: bool) -> RecordId {
    let store = driver.store();
    let record = store
        .find_or_create(RecordKind::Entity, name)
        .expect("entity record");
    let seen = if online {
        now_unix()
    } else {
        now_unix().saturating_sub(3600)
    };
    store
        .set_field(RecordKind::Entity, record.id, "last_seen", &seen.to_string())
        .expect("last_seen");
    store
        .set_field(RecordKind::Entity, record.id, "address", address)
        .expect("address");
    record.id
}

/// Spawns a job that runs until it is cancelled.
pub(crate) fn spawn_idle_job(driver: &mut Driver, name: &str) -> JobId {
    driver
        .jobs_mut()
        .spawn(name, |cancel: CancelToken| {
            while !cancel.sleep(Duration::from_secs(5)) {}
        })
        .expect("spawn idle job")
}

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    StoreReady(Option<String>),
    StoreDegraded(String),
    AutosaveFailed(String),
    ConsoleStopped,
}

/// Records health events for assertions.
#[derive(Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn store_ready(&self, location: Option<&Utf8Path>) {
        self.record(HealthEvent::StoreReady(location.map(|path| path.to_string())));
    }

    fn store_degraded(&self, error: &StoreError) {
        self.record(HealthEvent::StoreDegraded(error.to_string()));
    }

    fn autosave_failed(&self, error: &JobError) {
        self.record(HealthEvent::AutosaveFailed(error.to_string()));
    }

    fn console_stopped(&self) {
        self.record(HealthEvent::ConsoleStopped);
    }
}
