//! Static registry of record schemas.
//!
//! Every record kind the console persists is declared here once, together
//! with the field names a record of that kind may carry. The registry is a
//! compile-time table; nothing is discovered at runtime.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Kinds of persisted records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecordKind {
    /// Top-level investigation workspace.
    Project,
    /// Named grouping inside a project.
    Section,
    /// Anything that can be targeted: hosts, people, domains.
    Entity,
    /// Classification applied to entities.
    EntityType,
    /// Field declared by an entity type.
    EntityTypeField,
    /// Value of a typed field on one entity.
    EntityField,
}

/// Field layout of one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Kind described by this schema.
    pub kind: RecordKind,
    /// Field names a record of this kind may set.
    pub fields: &'static [&'static str],
}

impl RecordSchema {
    /// Returns `true` when `field` is declared by this schema.
    #[must_use]
    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

const PROJECT: RecordSchema = RecordSchema {
    kind: RecordKind::Project,
    fields: &["description", "owner", "created_at"],
};

const SECTION: RecordSchema = RecordSchema {
    kind: RecordKind::Section,
    fields: &["project_id", "description"],
};

const ENTITY: RecordSchema = RecordSchema {
    kind: RecordKind::Entity,
    fields: &[
        "project_id",
        "section_id",
        "entity_type_id",
        "address",
        "last_seen",
        "notes",
    ],
};

const ENTITY_TYPE: RecordSchema = RecordSchema {
    kind: RecordKind::EntityType,
    fields: &["description"],
};

const ENTITY_TYPE_FIELD: RecordSchema = RecordSchema {
    kind: RecordKind::EntityTypeField,
    fields: &["entity_type_id", "description"],
};

const ENTITY_FIELD: RecordSchema = RecordSchema {
    kind: RecordKind::EntityField,
    fields: &["entity_id", "entity_type_field_id", "value"],
};

/// Looks up the schema registered for `kind`.
#[must_use]
pub fn schema(kind: RecordKind) -> &'static RecordSchema {
    match kind {
        RecordKind::Project => &PROJECT,
        RecordKind::Section => &SECTION,
        RecordKind::Entity => &ENTITY,
        RecordKind::EntityType => &ENTITY_TYPE,
        RecordKind::EntityTypeField => &ENTITY_TYPE_FIELD,
        RecordKind::EntityField => &ENTITY_FIELD,
    }
}

/// Iterates over every registered schema in declaration order.
pub fn schemas() -> impl Iterator<Item = &'static RecordSchema> {
    RecordKind::iter().map(schema)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[test]
    fn every_kind_has_a_schema_with_unique_fields() {
        for schema in schemas() {
            assert_eq!(super::schema(schema.kind), schema);
            let unique: HashSet<_> = schema.fields.iter().collect();
            assert_eq!(unique.len(), schema.fields.len(), "{}", schema.kind);
        }
        assert_eq!(schemas().count(), 6);
    }

    #[rstest]
    #[case::snake("entity_type", RecordKind::EntityType)]
    #[case::upper("PROJECT", RecordKind::Project)]
    fn kinds_parse_from_snake_case(#[case] input: &str, #[case] expected: RecordKind) {
        assert_eq!(RecordKind::from_str(input).expect("kind"), expected);
    }

    #[test]
    fn entity_schema_declares_reachability_fields() {
        let entity = schema(RecordKind::Entity);
        assert!(entity.declares("address"));
        assert!(entity.declares("last_seen"));
        assert!(!entity.declares("password"));
    }
}
