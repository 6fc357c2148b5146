//! In-memory record table with an optional JSON snapshot.

use std::fs;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Persistence, Record, RecordId, RecordKind, STORE_TARGET, StoreError, validate_field,
};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    next_id: RecordId,
    #[serde(default)]
    records: Vec<Record>,
}

impl Snapshot {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }

    fn find_mut(&mut self, kind: RecordKind, id: RecordId) -> Result<&mut Record, StoreError> {
        self.records
            .iter_mut()
            .find(|record| record.kind == kind && record.id == id)
            .ok_or(StoreError::UnknownRecord { kind, id })
    }
}

/// Cloneable handle over a shared record table.
///
/// Clones observe the same records, which lets background jobs flush the
/// table while the console keeps serving commands.
#[derive(Debug, Clone)]
pub struct RecordStore {
    inner: Arc<Mutex<Snapshot>>,
    path: Option<Utf8PathBuf>,
}

impl RecordStore {
    /// Creates an empty store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Snapshot {
                version: SNAPSHOT_VERSION,
                ..Snapshot::default()
            })),
            path: None,
        }
    }

    /// Opens a store mirrored to `path`.
    ///
    /// A missing file yields an empty store; the file is created on the first
    /// flush.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or decoded.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<Snapshot>(&contents).map_err(|source| {
                StoreError::Decode {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => Snapshot {
                version: SNAPSHOT_VERSION,
                ..Snapshot::default()
            },
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(
            target: STORE_TARGET,
            path = %path,
            records = snapshot.records.len(),
            "opened record store"
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(snapshot)),
            path: Some(path),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Persistence for RecordStore {
    fn find_or_create(&self, kind: RecordKind, name: &str) -> Result<Record, StoreError> {
        let mut snapshot = self.lock()?;
        if let Some(existing) = snapshot
            .records
            .iter()
            .find(|record| record.kind == kind && record.name == name)
        {
            return Ok(existing.clone());
        }

        let record = Record {
            id: snapshot.allocate_id(),
            kind,
            name: name.to_owned(),
            fields: Default::default(),
        };
        debug!(target: STORE_TARGET, %kind, id = record.id, name, "created record");
        snapshot.records.push(record.clone());
        Ok(record)
    }

    fn get(&self, kind: RecordKind, id: RecordId) -> Result<Option<Record>, StoreError> {
        let snapshot = self.lock()?;
        Ok(snapshot
            .records
            .iter()
            .find(|record| record.kind == kind && record.id == id)
            .cloned())
    }

    fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        let snapshot = self.lock()?;
        let mut records: Vec<Record> = snapshot
            .records
            .iter()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    fn set_field(
        &self,
        kind: RecordKind,
        id: RecordId,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        validate_field(kind, field)?;
        let mut snapshot = self.lock()?;
        let record = snapshot.find_mut(kind, id)?;
        record.fields.insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear_field(
        &self,
        kind: RecordKind,
        id: RecordId,
        field: &str,
    ) -> Result<bool, StoreError> {
        validate_field(kind, field)?;
        let mut snapshot = self.lock()?;
        let record = snapshot.find_mut(kind, id)?;
        Ok(record.fields.remove(field).is_some())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let encoded = {
            let snapshot = self.lock()?;
            serde_json::to_string_pretty(&*snapshot).map_err(StoreError::Encode)?
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // Write beside the target and rename so readers never see a torn file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|source| StoreError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(target: STORE_TARGET, path = %path, "flushed record store");
        Ok(())
    }

    fn location(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn store() -> RecordStore {
        RecordStore::in_memory()
    }

    #[rstest]
    fn find_or_create_is_idempotent(store: RecordStore) {
        let first = store
            .find_or_create(RecordKind::Project, "alpha")
            .expect("create");
        let second = store
            .find_or_create(RecordKind::Project, "alpha")
            .expect("find");
        assert_eq!(first, second);
        assert_eq!(store.list(RecordKind::Project).expect("list").len(), 1);
    }

    #[rstest]
    fn identifiers_are_unique_across_kinds(store: RecordStore) {
        let project = store
            .find_or_create(RecordKind::Project, "alpha")
            .expect("project");
        let entity = store
            .find_or_create(RecordKind::Entity, "alpha")
            .expect("entity");
        assert_ne!(project.id, entity.id);
    }

    #[rstest]
    fn set_field_rejects_undeclared_fields(store: RecordStore) {
        let project = store
            .find_or_create(RecordKind::Project, "alpha")
            .expect("project");
        let error = store
            .set_field(RecordKind::Project, project.id, "address", "10.0.0.1")
            .expect_err("address is not a project field");
        assert!(matches!(error, StoreError::UnknownField { .. }));
    }

    #[rstest]
    fn set_and_clear_field_round_trip(store: RecordStore) {
        let entity = store
            .find_or_create(RecordKind::Entity, "web")
            .expect("entity");
        store
            .set_field(RecordKind::Entity, entity.id, "address", "10.0.0.1")
            .expect("set");
        let loaded = store
            .get(RecordKind::Entity, entity.id)
            .expect("get")
            .expect("present");
        assert_eq!(loaded.field("address"), Some("10.0.0.1"));
        assert!(
            store
                .clear_field(RecordKind::Entity, entity.id, "address")
                .expect("clear")
        );
        assert!(
            !store
                .clear_field(RecordKind::Entity, entity.id, "address")
                .expect("clear again")
        );
    }

    #[rstest]
    fn set_field_on_missing_record_fails(store: RecordStore) {
        let error = store
            .set_field(RecordKind::Entity, 99, "notes", "x")
            .expect_err("no record");
        assert!(matches!(error, StoreError::UnknownRecord { id: 99, .. }));
    }

    #[test]
    fn flush_then_open_restores_records() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/store.json"))
            .expect("utf8 path");

        let store = RecordStore::open(path.clone()).expect("open empty");
        let project = store
            .find_or_create(RecordKind::Project, "alpha")
            .expect("project");
        store
            .set_field(RecordKind::Project, project.id, "owner", "ops")
            .expect("set");
        store.flush().expect("flush");

        let reopened = RecordStore::open(path).expect("reopen");
        let restored = reopened.list(RecordKind::Project).expect("list");
        assert_eq!(restored, vec![project_with_owner(project.id)]);
        let next = reopened
            .find_or_create(RecordKind::Entity, "web")
            .expect("entity");
        assert!(next.id > project.id, "identifiers continue after reload");
    }

    fn project_with_owner(id: RecordId) -> Record {
        Record {
            id,
            kind: RecordKind::Project,
            name: "alpha".to_owned(),
            fields: [("owner".to_owned(), "ops".to_owned())].into_iter().collect(),
        }
    }

    #[test]
    fn open_rejects_malformed_snapshot() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("store.json")).expect("utf8 path");
        fs::write(&path, "{not json").expect("write");

        let error = RecordStore::open(path).expect_err("malformed");
        assert!(matches!(error, StoreError::Decode { .. }));
    }

    #[rstest]
    fn memory_store_flush_is_a_no_op(store: RecordStore) {
        store.flush().expect("flush");
        assert!(store.location().is_none());
    }
}
