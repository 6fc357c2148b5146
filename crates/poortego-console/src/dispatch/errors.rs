//! Error types for command dispatch failures.
//!
//! Handler failures fall into three groups. Usage problems and domain-state
//! refusals are expected and shown to the operator as a single line;
//! structural violations of the context stack indicate a bug and are also
//! logged at error level. Persistence and job failures pass through with
//! their own messages.

use thiserror::Error;

use crate::jobs::JobError;
use crate::store::StoreError;

/// Violations of the context stack invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    /// The context is already on the stack.
    #[error("the {name} context is already active")]
    DuplicateContext { name: &'static str },
    /// The root context cannot be removed.
    #[error("the {name} context is the root and cannot be removed")]
    RootRemoval { name: &'static str },
}

/// Errors returned by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No active context advertises the command.
    #[error("Unknown command: {command}.")]
    UnknownCommand { command: String },

    /// Arguments were supplied but not understood.
    #[error("Invalid parameter, try {command} -h for more information.")]
    InvalidParameter { command: &'static str },

    /// The command is valid but the console state does not allow it.
    #[error("{message}")]
    DomainState { message: String },

    /// A context transition broke a stack invariant.
    #[error(transparent)]
    Structural(#[from] StackError),

    /// Record persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Job bookkeeping failed.
    #[error(transparent)]
    Job(#[from] JobError),
}

impl CommandError {
    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid parameter error pointing at `command -h`.
    pub fn invalid_parameter(command: &'static str) -> Self {
        Self::InvalidParameter { command }
    }

    /// Creates a domain-state refusal.
    pub fn domain_state(message: impl Into<String>) -> Self {
        Self::DomainState {
            message: message.into(),
        }
    }

    /// Returns `true` for refusals that are reported as status lines.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::DomainState { .. })
    }

    /// Returns `true` for failures that indicate a console bug.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::unknown(CommandError::unknown_command("bogus"), "Unknown command: bogus.")]
    #[case::invalid(
        CommandError::invalid_parameter("show"),
        "Invalid parameter, try show -h for more information."
    )]
    #[case::domain(
        CommandError::domain_state("Entity does not appear to be online.."),
        "Entity does not appear to be online.."
    )]
    #[case::structural(
        CommandError::from(StackError::DuplicateContext { name: "Target" }),
        "the Target context is already active"
    )]
    fn messages_are_operator_readable(#[case] error: CommandError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn classifies_reporting_channel() {
        assert!(CommandError::domain_state("offline").is_status());
        assert!(!CommandError::unknown_command("x").is_status());
        assert!(CommandError::from(StackError::RootRemoval { name: "Core" }).is_structural());
    }
}
