//! Ordered stack of active contexts.

use tracing::debug;

use super::DISPATCH_TARGET;
use super::context::{Dispatcher, Handler};
use super::errors::StackError;

/// Active contexts, root first.
///
/// The root is fixed at construction and never removed, so the stack is
/// never empty. Each context appears at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherStack {
    entries: Vec<Dispatcher>,
}

impl DispatcherStack {
    /// Creates a stack holding only `root`.
    #[must_use]
    pub fn new(root: Dispatcher) -> Self {
        Self {
            entries: vec![root],
        }
    }

    /// Pushes `dispatcher` on top.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DuplicateContext`] when it is already active.
    pub fn push(&mut self, dispatcher: Dispatcher) -> Result<(), StackError> {
        if self.entries.contains(&dispatcher) {
            return Err(StackError::DuplicateContext {
                name: dispatcher.name(),
            });
        }
        self.entries.push(dispatcher);
        debug!(target: DISPATCH_TARGET, context = dispatcher.name(), depth = self.len(), "context pushed");
        Ok(())
    }

    /// Removes and returns the top context.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RootRemoval`] when only the root remains.
    pub fn pop(&mut self) -> Result<Dispatcher, StackError> {
        let root = self.root().name();
        let popped = if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
        .ok_or(StackError::RootRemoval { name: root })?;
        debug!(target: DISPATCH_TARGET, context = popped.name(), depth = self.len(), "context popped");
        Ok(popped)
    }

    /// Removes the topmost context called `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RootRemoval`] when `name` only matches the root.
    pub fn remove(&mut self, name: &str) -> Result<Option<Dispatcher>, StackError> {
        let Some(position) = self.entries.iter().rposition(|entry| entry.name() == name) else {
            return Ok(None);
        };
        if position == 0 {
            return Err(StackError::RootRemoval {
                name: self.root().name(),
            });
        }
        let removed = self.entries.remove(position);
        debug!(target: DISPATCH_TARGET, context = removed.name(), depth = self.len(), "context removed");
        Ok(Some(removed))
    }

    /// The context that receives commands first.
    #[must_use]
    pub fn top(&self) -> Dispatcher {
        self.entries.last().copied().unwrap_or_else(|| self.root())
    }

    /// The context at the bottom of the stack.
    #[must_use]
    pub fn root(&self) -> Dispatcher {
        self.entries.first().copied().unwrap_or(Dispatcher::Core)
    }

    /// Returns `true` when a context called `name` is active.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name() == name)
    }

    /// Number of active contexts, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contexts from top to root.
    pub fn iter_top_down(&self) -> impl Iterator<Item = Dispatcher> + '_ {
        self.entries.iter().rev().copied()
    }

    /// Context names from root to top.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    /// Finds the topmost context that advertises `command`.
    #[must_use]
    pub fn resolve(&self, command: &str) -> Option<(Dispatcher, Handler)> {
        self.iter_top_down().find_map(|dispatcher| {
            dispatcher
                .resolve(command)
                .map(|handler| (dispatcher, handler))
        })
    }
}

impl Default for DispatcherStack {
    fn default() -> Self {
        Self::new(Dispatcher::Core)
    }
}
