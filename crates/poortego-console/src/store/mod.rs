//! Record persistence used by console handlers.
//!
//! Handlers reach storage only through the [`Persistence`] trait: find-or-create
//! by name plus field-level reads and writes validated against the static
//! schema registry in [`schema`]. [`RecordStore`] is the shipped
//! implementation, an in-memory table optionally mirrored to a JSON snapshot.

mod records;
pub mod schema;

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use records::RecordStore;
pub use schema::{RecordKind, RecordSchema};

/// Tracing target for store operations.
pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Identifier allocated to a record when it is first created.
pub type RecordId = u64;

/// A persisted record: a named row plus free-form schema-checked fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier across every kind.
    pub id: RecordId,
    /// Kind of the record.
    pub kind: RecordKind,
    /// Name used for find-or-create lookups.
    pub name: String,
    /// Field values keyed by schema field name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Returns the value of `field`, if set.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Errors surfaced by record persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot failed.
    #[error("store I/O failed for '{path}': {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The snapshot could not be decoded.
    #[error("store snapshot '{path}' is malformed: {source}")]
    Decode {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The snapshot could not be encoded.
    #[error("failed to encode store snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    /// The field is not declared by the kind's schema.
    #[error("{kind} records have no field named '{field}'")]
    UnknownField { kind: RecordKind, field: String },
    /// No record of the kind carries the identifier.
    #[error("no {kind} record with id {id}")]
    UnknownRecord { kind: RecordKind, id: RecordId },
    /// A writer panicked while holding the record lock.
    #[error("record store lock poisoned")]
    Poisoned,
}

/// Narrow persistence contract consumed by handlers.
pub trait Persistence: Send + Sync {
    /// Returns the record of `kind` named `name`, creating it if absent.
    fn find_or_create(&self, kind: RecordKind, name: &str) -> Result<Record, StoreError>;

    /// Looks a record up by identifier.
    fn get(&self, kind: RecordKind, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Returns every record of `kind`, ordered by identifier.
    fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError>;

    /// Sets one field, validated against the kind's schema.
    fn set_field(
        &self,
        kind: RecordKind,
        id: RecordId,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Removes one field. Returns `true` when a value was present.
    fn clear_field(&self, kind: RecordKind, id: RecordId, field: &str)
    -> Result<bool, StoreError>;

    /// Writes outstanding changes to durable storage, if any is configured.
    fn flush(&self) -> Result<(), StoreError>;

    /// Snapshot location, or `None` for memory-only stores.
    fn location(&self) -> Option<&Utf8Path>;
}

fn validate_field(kind: RecordKind, field: &str) -> Result<(), StoreError> {
    if schema::schema(kind).declares(field) {
        Ok(())
    } else {
        Err(StoreError::UnknownField {
            kind,
            field: field.to_owned(),
        })
    }
}
