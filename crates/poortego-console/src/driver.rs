//! The console driver.
//!
//! The driver owns everything a command handler may touch: the context stack,
//! the prompt, the domain focus, the job registry and the record store. It
//! is single-threaded; only jobs run elsewhere, and they receive clones of
//! the store handle rather than access to the driver.

use std::sync::Arc;

use poortego_config::{Config, DEFAULT_ONLINE_WINDOW_SECS, DEFAULT_PROTECTED_JOB};
use tracing::warn;

use crate::dispatch::{
    CommandRouter, Dispatcher, DispatcherStack, RouteOutcome, StackError,
};
use crate::health::LIFECYCLE_TARGET;
use crate::interface::Focus;
use crate::jobs::JobRegistry;
use crate::output::Output;
use crate::prompt;
use crate::store::Persistence;

/// Runtime settings handlers consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    protected_job: String,
    online_window_secs: u64,
}

impl Settings {
    /// Extracts the handler-facing settings from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            protected_job: config.protected_job().to_owned(),
            online_window_secs: config.online_window_secs(),
        }
    }

    /// Job name `jobs -k` refuses to stop.
    #[must_use]
    pub fn protected_job(&self) -> &str {
        &self.protected_job
    }

    /// Seconds within which an entity counts as online.
    #[must_use]
    pub fn online_window_secs(&self) -> u64 {
        self.online_window_secs
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protected_job: DEFAULT_PROTECTED_JOB.to_owned(),
            online_window_secs: DEFAULT_ONLINE_WINDOW_SECS,
        }
    }
}

/// Console state shared by every handler invocation.
pub struct Driver {
    stack: DispatcherStack,
    prompt: String,
    focus: Focus,
    jobs: JobRegistry,
    store: Arc<dyn Persistence>,
    settings: Settings,
    router: CommandRouter,
    running: bool,
}

impl Driver {
    /// Creates a driver with only the root context active.
    #[must_use]
    pub fn new(store: Arc<dyn Persistence>, settings: Settings) -> Self {
        Self {
            stack: DispatcherStack::new(Dispatcher::Core),
            prompt: String::new(),
            focus: Focus::default(),
            jobs: JobRegistry::new(),
            store,
            settings,
            router: CommandRouter::new(),
            running: true,
        }
    }

    /// Routes one input line.
    pub fn run_single(&mut self, line: &str, output: &mut Output<'_>) -> RouteOutcome {
        let router = self.router;
        router.route(self, line, output)
    }

    /// Pushes a context.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DuplicateContext`] when it is already active.
    pub fn enstack(&mut self, dispatcher: Dispatcher) -> Result<(), StackError> {
        self.stack.push(dispatcher)
    }

    /// Pops the top context.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RootRemoval`] when only the root is active.
    pub fn destack(&mut self) -> Result<Dispatcher, StackError> {
        self.stack.pop()
    }

    /// Removes the topmost context called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::RootRemoval`] when `name` only matches the root.
    pub fn remove_dispatcher(&mut self, name: &str) -> Result<Option<Dispatcher>, StackError> {
        self.stack.remove(name)
    }

    /// Pops every non-root context, releasing the focus each one owned.
    ///
    /// # Errors
    ///
    /// Propagates stack violations.
    pub fn unwind_to_root(&mut self) -> Result<(), StackError> {
        while self.stack.len() > 1 {
            let popped = self.stack.pop()?;
            popped.release(&mut self.focus);
        }
        self.refresh_prompt();
        Ok(())
    }

    /// Context that receives commands first.
    #[must_use]
    pub fn current_dispatcher(&self) -> Dispatcher {
        self.stack.top()
    }

    /// Returns `true` when a context called `name` is active.
    #[must_use]
    pub fn dispatcher_enstacked(&self, name: &str) -> bool {
        self.stack.contains(name)
    }

    #[must_use]
    pub fn dispatcher_stack(&self) -> &DispatcherStack {
        &self.stack
    }

    /// Context segment of the prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Replaces the context segment of the prompt.
    pub fn update_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Recomputes the prompt from the stack and focus.
    pub fn refresh_prompt(&mut self) {
        self.prompt = prompt::render(&self.stack, &self.focus);
    }

    #[must_use]
    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut Focus {
        &mut self.focus
    }

    #[must_use]
    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobRegistry {
        &mut self.jobs
    }

    /// Record persistence.
    #[must_use]
    pub fn store(&self) -> &dyn Persistence {
        self.store.as_ref()
    }

    /// Shared store handle for work that outlives a handler call.
    #[must_use]
    pub fn store_handle(&self) -> Arc<dyn Persistence> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Asks the input loop to stop after the current line.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Cancels running jobs and flushes the store.
    pub fn shutdown(&mut self) {
        self.jobs.shutdown();
        if let Err(error) = self.store.flush() {
            warn!(target: LIFECYCLE_TARGET, %error, "final store flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::interface::ProjectFocus;
    use crate::store::RecordStore;

    #[fixture]
    fn driver() -> Driver {
        Driver::new(Arc::new(RecordStore::in_memory()), Settings::default())
    }

    #[rstest]
    fn starts_at_the_root(driver: Driver) {
        assert_eq!(driver.current_dispatcher(), Dispatcher::Core);
        assert_eq!(driver.prompt(), "");
        assert!(driver.is_running());
    }

    #[rstest]
    fn unwinding_releases_focus_and_prompt(mut driver: Driver) {
        driver.focus_mut().set_project(ProjectFocus {
            id: 1,
            name: "alpha".to_owned(),
        });
        driver.enstack(Dispatcher::Project).expect("push");
        driver.refresh_prompt();
        assert_eq!(driver.prompt(), "(alpha)");

        driver.unwind_to_root().expect("unwind");
        assert_eq!(driver.dispatcher_stack().names(), vec!["Core"]);
        assert!(driver.focus().project().is_none());
        assert_eq!(driver.prompt(), "");
    }

    #[rstest]
    fn destack_refuses_the_root(mut driver: Driver) {
        assert!(driver.destack().is_err());
        assert_eq!(driver.dispatcher_stack().len(), 1);
    }

    #[rstest]
    fn stop_ends_the_session(mut driver: Driver) {
        driver.stop();
        assert!(!driver.is_running());
    }
}
