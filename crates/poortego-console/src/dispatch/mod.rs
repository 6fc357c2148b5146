//! Context-sensitive command dispatch.
//!
//! Every console context is a [`Dispatcher`] that owns a static
//! [`CommandTable`] plus the handlers behind it. The driver keeps the active
//! contexts on a [`DispatcherStack`]; the [`CommandRouter`] tokenises each
//! input line and hands it to the topmost dispatcher that knows the command,
//! so deeper contexts shadow the commands of the ones beneath them.

mod command;
mod completion;
mod context;
mod errors;
mod project;
mod root;
mod router;
mod stack;
mod table;
mod target;

pub use completion::{Completion, complete};
pub use context::{CompletionProvider, Dispatcher, Handler};
pub use errors::{CommandError, StackError};
pub use router::{CommandRouter, RouteOutcome};
pub use stack::DispatcherStack;
pub use table::{CommandEntry, CommandTable};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
