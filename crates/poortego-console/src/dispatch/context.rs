//! The closed set of console contexts.

use crate::driver::Driver;
use crate::interface::Focus;
use crate::output::Output;

use super::errors::CommandError;
use super::table::CommandTable;
use super::{command, project, root, target};

/// Command handler. Receives the arguments after the command token.
pub type Handler = fn(&mut Driver, &mut Output<'_>, &[String]) -> Result<(), CommandError>;

/// Completion provider. Receives the complete argument tokens already typed
/// after the command and returns candidates for the next one; the caller
/// filters them by the partial token.
pub type CompletionProvider = fn(&Driver, &[String]) -> Vec<String>;

/// A console context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatcher {
    /// Root context; always at the bottom of the stack.
    Core,
    /// Scoped to a project record.
    Project,
    /// Scoped to a targeted entity.
    Target,
    /// Scoped to a command module selected against the target.
    Command,
}

impl Dispatcher {
    /// Every context, root first.
    pub const ALL: [Self; 4] = [Self::Core, Self::Project, Self::Target, Self::Command];

    /// Display name used in help titles and by name-based stack operations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::Project => "Project",
            Self::Target => "Target",
            Self::Command => "Command",
        }
    }

    /// Commands this context advertises.
    #[must_use]
    pub fn commands(self) -> &'static CommandTable {
        match self {
            Self::Core => &root::COMMANDS,
            Self::Project => &project::COMMANDS,
            Self::Target => &target::COMMANDS,
            Self::Command => &command::COMMANDS,
        }
    }

    /// Handler for `command`, when this context advertises it.
    #[must_use]
    pub fn resolve(self, command: &str) -> Option<Handler> {
        if !self.commands().contains(command) {
            return None;
        }
        match self {
            Self::Core => root::handler(command),
            Self::Project => project::handler(command),
            Self::Target => target::handler(command),
            Self::Command => command::handler(command),
        }
    }

    /// Completion provider registered for `command`, if any.
    #[must_use]
    pub fn completion(self, command: &str) -> Option<CompletionProvider> {
        if !self.commands().contains(command) {
            return None;
        }
        match self {
            Self::Core => root::completion(command),
            Self::Project => project::completion(command),
            Self::Target => target::completion(command),
            Self::Command => command::completion(command),
        }
    }

    /// Leaves this context in response to `back`.
    ///
    /// # Errors
    ///
    /// Returns a structural error if the stack refuses the transition.
    pub fn unwind(self, driver: &mut Driver) -> Result<(), CommandError> {
        match self {
            Self::Core => Ok(()),
            Self::Project => project::unwind(driver),
            Self::Target => target::unwind(driver),
            Self::Command => command::unwind(driver),
        }
    }

    /// Drops whatever part of the focus this context owned.
    pub fn release(self, focus: &mut Focus) {
        match self {
            Self::Core => {}
            Self::Project => focus.clear_project(),
            Self::Target => focus.clear_target(),
            Self::Command => focus.clear_command(),
        }
    }
}
