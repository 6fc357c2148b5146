//! Static command tables.

use crate::table::Table;

/// One command advertised by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
}

impl CommandEntry {
    pub(crate) const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

/// Ordered command names and descriptions for one context.
///
/// Tables are declared as constants and never change at runtime. Names are
/// unique within a table; the order is the order help output uses.
#[derive(Debug, Clone, Copy)]
pub struct CommandTable {
    entries: &'static [CommandEntry],
}

impl CommandTable {
    pub(crate) const fn new(entries: &'static [CommandEntry]) -> Self {
        Self { entries }
    }

    /// Returns `true` when the table advertises `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static CommandEntry> {
        self.entries.iter()
    }

    /// Command names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|entry| entry.name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the table as a titled two-column listing.
    #[must_use]
    pub fn render(&self, title: &str) -> String {
        let mut table = Table::new(["Command", "Description"]).with_title(title);
        for entry in self.entries {
            table.push_row([entry.name, entry.description]);
        }
        table.render()
    }
}
