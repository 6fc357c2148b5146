//! Line routing.
//!
//! The router splits a line on whitespace, resolves the first token against
//! the context stack from the top down, and invokes the owning handler with
//! the remaining tokens. Every failure is turned into exactly one operator
//! line here; nothing escapes to the input loop.

use tracing::{debug, error};

use crate::driver::Driver;
use crate::output::Output;

use super::DISPATCH_TARGET;
use super::errors::CommandError;

/// What happened to a routed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The line held no tokens.
    Empty,
    /// A handler ran to completion.
    Handled,
    /// A handler reported an error.
    Failed,
    /// No active context advertises the command.
    Unknown,
}

/// Routes input lines to handlers on the driver's context stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRouter;

impl CommandRouter {
    /// Creates a new router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Splits a line into whitespace-separated tokens.
    #[must_use]
    pub fn tokenize(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_owned).collect()
    }

    /// Routes one line.
    pub fn route(&self, driver: &mut Driver, line: &str, output: &mut Output<'_>) -> RouteOutcome {
        let tokens = Self::tokenize(line);
        let Some((command, args)) = tokens.split_first() else {
            return RouteOutcome::Empty;
        };

        let Some((owner, handler)) = driver.dispatcher_stack().resolve(command) else {
            debug!(target: DISPATCH_TARGET, command = %command, "unknown command");
            output.error(CommandError::unknown_command(command.as_str()).to_string());
            return RouteOutcome::Unknown;
        };

        debug!(
            target: DISPATCH_TARGET,
            command = %command,
            context = owner.name(),
            args = args.len(),
            "routing command"
        );
        match handler(driver, output, args) {
            Ok(()) => RouteOutcome::Handled,
            Err(failure) => {
                report(command, &failure, output);
                RouteOutcome::Failed
            }
        }
    }
}

fn report(command: &str, failure: &CommandError, output: &mut Output<'_>) {
    if failure.is_structural() {
        error!(target: DISPATCH_TARGET, command, error = %failure, "context stack violation");
    } else {
        debug!(target: DISPATCH_TARGET, command, error = %failure, "command failed");
    }
    if failure.is_status() {
        output.status(failure.to_string());
    } else {
        output.error(failure.to_string());
    }
}
