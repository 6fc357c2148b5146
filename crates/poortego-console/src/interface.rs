//! Domain focus shared by the console contexts.
//!
//! The focus records which project, entity, and command module the active
//! contexts are scoped to. Entity reachability is derived from the
//! `last_seen` field: an entity is online while it was seen within the
//! configured window and offline otherwise.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::modules::ModuleSpec;
use crate::store::{Persistence, Record, RecordId, RecordKind, StoreError};

/// Whether an entity has been seen recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Online,
    Offline,
}

impl Reachability {
    /// Lower-case label used in status messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Project the console is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFocus {
    pub id: RecordId,
    pub name: String,
}

/// Entity the console is targeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFocus {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub reachability: Reachability,
}

impl TargetFocus {
    /// Builds a target focus from an entity record.
    #[must_use]
    pub fn from_record(record: &Record, reachability: Reachability) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            address: record.field("address").unwrap_or("unknown").to_owned(),
            reachability,
        }
    }
}

/// Command module selected against the current target.
#[derive(Debug, Clone)]
pub struct CommandFocus {
    pub module: &'static ModuleSpec,
    pub params: BTreeMap<String, String>,
}

/// Everything the non-root contexts are scoped to.
#[derive(Debug, Clone, Default)]
pub struct Focus {
    project: Option<ProjectFocus>,
    target: Option<TargetFocus>,
    command: Option<CommandFocus>,
}

impl Focus {
    #[must_use]
    pub fn project(&self) -> Option<&ProjectFocus> {
        self.project.as_ref()
    }

    pub fn set_project(&mut self, project: ProjectFocus) {
        self.project = Some(project);
    }

    pub fn clear_project(&mut self) {
        self.project = None;
    }

    #[must_use]
    pub fn target(&self) -> Option<&TargetFocus> {
        self.target.as_ref()
    }

    /// Targets a new entity. Any selected command module belonged to the
    /// previous target and is dropped.
    pub fn set_target(&mut self, target: TargetFocus) {
        self.target = Some(target);
        self.command = None;
    }

    /// Clears the target together with its command module.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.command = None;
    }

    #[must_use]
    pub fn command(&self) -> Option<&CommandFocus> {
        self.command.as_ref()
    }

    pub fn command_mut(&mut self) -> Option<&mut CommandFocus> {
        self.command.as_mut()
    }

    pub fn select_command(&mut self, module: &'static ModuleSpec) {
        self.command = Some(CommandFocus {
            module,
            params: BTreeMap::new(),
        });
    }

    pub fn clear_command(&mut self) {
        self.command = None;
    }
}

/// Current time as whole seconds since the Unix epoch.
#[must_use]
pub fn now_unix() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(0)
}

/// Renders a `last_seen` value for display.
#[must_use]
pub fn format_timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| seconds.to_string())
}

/// Classifies an entity record. Missing or unparsable timestamps are offline.
#[must_use]
pub fn reachability(record: &Record, now: u64, window_secs: u64) -> Reachability {
    match record
        .field("last_seen")
        .and_then(|value| value.parse::<u64>().ok())
    {
        Some(seen) if now.saturating_sub(seen) <= window_secs => Reachability::Online,
        _ => Reachability::Offline,
    }
}

/// Lists entities with the given reachability, ordered by id.
///
/// # Errors
///
/// Propagates persistence failures.
pub fn entities(
    store: &dyn Persistence,
    wanted: Reachability,
    now: u64,
    window_secs: u64,
) -> Result<Vec<Record>, StoreError> {
    Ok(store
        .list(RecordKind::Entity)?
        .into_iter()
        .filter(|record| reachability(record, now, window_secs) == wanted)
        .collect())
}

/// Resolves an operator-supplied id to an entity with the wanted reachability.
///
/// Returns `Ok(None)` for ids that are not numeric, unknown, or not currently
/// in the wanted state.
///
/// # Errors
///
/// Propagates persistence failures.
pub fn reachable_entity(
    store: &dyn Persistence,
    raw_id: &str,
    wanted: Reachability,
    now: u64,
    window_secs: u64,
) -> Result<Option<Record>, StoreError> {
    let Ok(id) = raw_id.parse::<RecordId>() else {
        return Ok(None);
    };
    Ok(store
        .get(RecordKind::Entity, id)?
        .filter(|record| reachability(record, now, window_secs) == wanted))
}
