//! Background job registry.
//!
//! Jobs run on their own threads outside the read/route/handle cycle. The
//! console only lists them and requests termination by id; cancellation is
//! cooperative through the [`CancelToken`] handed to each job's work.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Tracing target for job bookkeeping.
pub(crate) const JOBS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jobs");

const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Finished jobs remembered for `jobs -l`.
const FINISHED_HISTORY: usize = 16;

/// Identifier assigned to a job when it is spawned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Parses an operator-supplied id.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Cooperative cancellation flag shared with a running job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Returns `true` once termination has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Requests termination.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Sleeps for up to `duration`, waking early on cancellation.
    ///
    /// Returns `true` when the job should stop.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(CANCEL_POLL.min(deadline - now));
        }
        true
    }
}

/// Read-only view of one registered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: JobId,
    pub name: String,
    pub running: bool,
    /// Line reported by the job when it returned, if any.
    pub result: Option<String>,
}

/// Errors surfaced by the job registry.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job is registered under the id.
    #[error("no such job: {0}")]
    NotFound(String),
    /// The worker thread could not be started.
    #[error("failed to start job '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
struct Job {
    name: String,
    cancel: CancelToken,
    handle: JoinHandle<Option<String>>,
}

/// Registry of background jobs owned by the console driver.
///
/// Stopped jobs leave the listing at once but their threads are still
/// joined, either when they are seen to finish or at shutdown.
#[derive(Debug, Default)]
pub struct JobRegistry {
    next_id: u64,
    jobs: BTreeMap<JobId, Job>,
    stopped: Vec<(JobId, Job)>,
    finished: VecDeque<JobSummary>,
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `work` on a new thread and registers it under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Spawn`] when the thread cannot be created.
    pub fn spawn<F>(&mut self, name: impl Into<String>, work: F) -> Result<JobId, JobError>
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        self.spawn_reporting(name, move |cancel| {
            work(cancel);
            None
        })
    }

    /// Like [`JobRegistry::spawn`], keeping the line `work` returns so it
    /// can be listed once the job finishes.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Spawn`] when the thread cannot be created.
    pub fn spawn_reporting<F>(
        &mut self,
        name: impl Into<String>,
        work: F,
    ) -> Result<JobId, JobError>
    where
        F: FnOnce(CancelToken) -> Option<String> + Send + 'static,
    {
        let name = name.into();
        let id = JobId(self.next_id);
        let cancel = CancelToken::default();
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name(format!("job-{id}"))
            .spawn(move || work(worker_cancel))
            .map_err(|source| JobError::Spawn {
                name: name.clone(),
                source,
            })?;
        self.next_id += 1;
        info!(target: JOBS_TARGET, job = %id, name = %name, "job started");
        self.jobs.insert(
            id.clone(),
            Job {
                name,
                cancel,
                handle,
            },
        );
        Ok(id)
    }

    /// Looks up the name of a registered job.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<JobSummary> {
        let id = JobId::parse(id)?;
        self.jobs.get(&id).map(|job| summarise(&id, job))
    }

    /// Returns `true` when a job is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Requests termination of the job and removes it from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] when no job carries the id.
    pub fn stop(&mut self, id: &str) -> Result<JobSummary, JobError> {
        let parsed = JobId::parse(id).ok_or_else(|| JobError::NotFound(id.to_owned()))?;
        let job = self
            .jobs
            .remove(&parsed)
            .ok_or_else(|| JobError::NotFound(id.to_owned()))?;
        job.cancel.cancel();
        info!(target: JOBS_TARGET, job = %parsed, name = %job.name, "job stopped");
        let summary = JobSummary {
            id: parsed.clone(),
            name: job.name.clone(),
            running: false,
            result: None,
        };
        self.stopped.push((parsed, job));
        Ok(summary)
    }

    /// Lists registered jobs in id order after pruning finished ones.
    pub fn list(&mut self) -> Vec<JobSummary> {
        self.prune();
        self.snapshot()
    }

    /// Most recently finished jobs first, with whatever they reported.
    #[must_use]
    pub fn finished(&self) -> Vec<JobSummary> {
        self.finished.iter().rev().cloned().collect()
    }

    /// Lists registered jobs without pruning, for read-only callers.
    #[must_use]
    pub fn snapshot(&self) -> Vec<JobSummary> {
        self.jobs.iter().map(|(id, job)| summarise(id, job)).collect()
    }

    /// Number of registered jobs, including finished ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Cancels every job, including stopped ones still winding down, and
    /// waits for the workers to return.
    pub fn shutdown(&mut self) {
        for job in self.jobs.values() {
            job.cancel.cancel();
        }
        let running = std::mem::take(&mut self.jobs);
        let stopped = std::mem::take(&mut self.stopped);
        for (id, job) in running.into_iter().chain(stopped) {
            self.reap(id, job);
        }
    }

    fn prune(&mut self) {
        let finished: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        for id in finished {
            if let Some(job) = self.jobs.remove(&id) {
                debug!(target: JOBS_TARGET, job = %id, name = %job.name, "job completed");
                self.reap(id, job);
            }
        }

        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.stopped)
            .into_iter()
            .partition(|(_, job)| job.handle.is_finished());
        self.stopped = pending;
        for (id, job) in done {
            self.reap(id, job);
        }
    }

    fn reap(&mut self, id: JobId, job: Job) {
        let result = match job.handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!(target: JOBS_TARGET, job = %id, name = %job.name, "job panicked");
                Some("panicked".to_owned())
            }
        };
        if self.finished.len() == FINISHED_HISTORY {
            self.finished.pop_front();
        }
        self.finished.push_back(JobSummary {
            id,
            name: job.name,
            running: false,
            result,
        });
    }
}

fn summarise(id: &JobId, job: &Job) -> JobSummary {
    JobSummary {
        id: id.clone(),
        name: job.name.clone(),
        running: !job.handle.is_finished(),
        result: None,
    }
}
