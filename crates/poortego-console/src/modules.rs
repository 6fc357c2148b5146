//! Command modules that can be run against a targeted entity.
//!
//! Modules form a fixed catalogue. Each declares its options so the command
//! context can validate parameters and offer completions before a run is
//! handed to the job registry.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::jobs::CancelToken;
use crate::store::{Persistence, Record, RecordKind, StoreError};

/// Option accepted by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleOption {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Inputs for one module run.
pub struct ModuleRun<'a> {
    /// Entity the module operates on.
    pub target: &'a Record,
    /// Operator-supplied option values.
    pub params: &'a BTreeMap<String, String>,
    /// Record persistence.
    pub store: &'a dyn Persistence,
    /// Cancellation requested through `jobs -k`.
    pub cancel: &'a CancelToken,
}

/// Errors surfaced while running a module.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A required option has no value.
    #[error("required option '{0}' is not set")]
    MissingOption(&'static str),
    /// The run was cancelled before completing.
    #[error("module run cancelled")]
    Cancelled,
    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalogue entry describing one module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub options: &'static [ModuleOption],
    run: fn(&ModuleRun<'_>) -> Result<String, ModuleError>,
}

impl ModuleSpec {
    /// Looks up a declared option.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&'static ModuleOption> {
        self.options.iter().find(|option| option.name == name)
    }

    /// Required options that have no value in `params`.
    #[must_use]
    pub fn missing_options(&self, params: &BTreeMap<String, String>) -> Vec<&'static str> {
        self.options
            .iter()
            .filter(|option| option.required && !params.contains_key(option.name))
            .map(|option| option.name)
            .collect()
    }

    /// Runs the module to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error when options are missing, the run is cancelled, or
    /// persistence fails.
    pub fn run(&self, run: &ModuleRun<'_>) -> Result<String, ModuleError> {
        if let Some(missing) = self.missing_options(run.params).first() {
            return Err(ModuleError::MissingOption(*missing));
        }
        if run.cancel.is_cancelled() {
            return Err(ModuleError::Cancelled);
        }
        (self.run)(run)
    }
}

const CATALOGUE: &[ModuleSpec] = &[
    ModuleSpec {
        name: "annotate",
        description: "Attach a note to the targeted entity",
        options: &[ModuleOption {
            name: "note",
            required: true,
            description: "Text stored in the entity's notes field",
        }],
        run: run_annotate,
    },
    ModuleSpec {
        name: "fingerprint",
        description: "Summarise everything recorded about the targeted entity",
        options: &[ModuleOption {
            name: "fields",
            required: false,
            description: "Comma-separated list of fields to include",
        }],
        run: run_fingerprint,
    },
];

/// Every module known to the console, sorted by name.
#[must_use]
pub fn catalogue() -> &'static [ModuleSpec] {
    CATALOGUE
}

/// Looks a module up by name.
#[must_use]
pub fn find(name: &str) -> Option<&'static ModuleSpec> {
    CATALOGUE.iter().find(|module| module.name == name)
}

fn run_annotate(run: &ModuleRun<'_>) -> Result<String, ModuleError> {
    let note = run
        .params
        .get("note")
        .ok_or(ModuleError::MissingOption("note"))?;
    run.store
        .set_field(RecordKind::Entity, run.target.id, "notes", note)?;
    Ok(format!("annotated entity {}", run.target.id))
}

fn run_fingerprint(run: &ModuleRun<'_>) -> Result<String, ModuleError> {
    let current = run
        .store
        .get(RecordKind::Entity, run.target.id)?
        .unwrap_or_else(|| run.target.clone());
    let wanted: Option<Vec<&str>> = run
        .params
        .get("fields")
        .map(|fields| fields.split(',').map(str::trim).collect());

    let mut summary = format!("entity {} ({})", current.id, current.name);
    for (field, value) in &current.fields {
        if wanted
            .as_ref()
            .is_some_and(|wanted| !wanted.contains(&field.as_str()))
        {
            continue;
        }
        let _ = write!(summary, " {field}={value}");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::store::RecordStore;

    #[fixture]
    fn store() -> RecordStore {
        RecordStore::in_memory()
    }

    fn entity(store: &RecordStore) -> Record {
        let record = store
            .find_or_create(RecordKind::Entity, "web")
            .expect("entity");
        store
            .set_field(RecordKind::Entity, record.id, "address", "10.0.0.5")
            .expect("address");
        record
    }

    #[test]
    fn catalogue_is_sorted_and_unique() {
        let names: Vec<&str> = catalogue().iter().map(|module| module.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[rstest]
    fn annotate_requires_note(store: RecordStore) {
        let target = entity(&store);
        let params = BTreeMap::new();
        let cancel = CancelToken::default();
        let module = find("annotate").expect("annotate module");
        let error = module
            .run(&ModuleRun {
                target: &target,
                params: &params,
                store: &store,
                cancel: &cancel,
            })
            .expect_err("missing note");
        assert!(matches!(error, ModuleError::MissingOption("note")));
    }

    #[rstest]
    fn annotate_writes_notes_field(store: RecordStore) {
        let target = entity(&store);
        let params = BTreeMap::from([("note".to_owned(), "primary web host".to_owned())]);
        let cancel = CancelToken::default();
        let module = find("annotate").expect("annotate module");
        module
            .run(&ModuleRun {
                target: &target,
                params: &params,
                store: &store,
                cancel: &cancel,
            })
            .expect("run");

        let updated = store
            .get(RecordKind::Entity, target.id)
            .expect("get")
            .expect("present");
        assert_eq!(updated.field("notes"), Some("primary web host"));
    }

    #[rstest]
    fn fingerprint_filters_fields(store: RecordStore) {
        let target = entity(&store);
        store
            .set_field(RecordKind::Entity, target.id, "notes", "db")
            .expect("notes");
        let params = BTreeMap::from([("fields".to_owned(), "address".to_owned())]);
        let cancel = CancelToken::default();
        let summary = find("fingerprint")
            .expect("fingerprint module")
            .run(&ModuleRun {
                target: &target,
                params: &params,
                store: &store,
                cancel: &cancel,
            })
            .expect("run");
        assert!(summary.contains("address=10.0.0.5"));
        assert!(!summary.contains("notes="));
    }

    #[rstest]
    fn cancelled_runs_do_not_start(store: RecordStore) {
        let target = entity(&store);
        let params = BTreeMap::new();
        let cancel = CancelToken::default();
        cancel.cancel();
        let error = find("fingerprint")
            .expect("fingerprint module")
            .run(&ModuleRun {
                target: &target,
                params: &params,
                store: &store,
                cancel: &cancel,
            })
            .expect_err("cancelled");
        assert!(matches!(error, ModuleError::Cancelled));
    }
}
