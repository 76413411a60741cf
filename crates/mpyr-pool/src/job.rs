//! Job ids and completion bookkeeping.
//!
//! Every scheduled job gets a [`JobId`] and a completion slot in the pool's
//! [`JobTable`]. The slot stays in the table until the caller releases it,
//! which is only allowed once the job has finished. Ids increase monotonically
//! and are never handed out twice.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{error, trace};

use crate::{PoolError, PoolResult};

/// Opaque handle of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Numeric value of the id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How long [`wait`](crate::ThreadPool::wait) may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Block until the job completes.
    #[default]
    Infinite,
    /// Give up after the duration.
    After(Duration),
}

impl Timeout {
    /// Host convention: `0` means wait forever.
    pub fn from_millis(ms: u64) -> Self {
        Duration::from_millis(ms).into()
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Self::Infinite
        } else {
            Self::After(d)
        }
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Self::Infinite, Self::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Pending,
    Done,
    Panicked,
}

/// Completion slot shared between the table and the running job.
#[derive(Debug)]
pub(crate) struct Completion {
    state: Mutex<JobState>,
    changed: Condvar,
}

impl Completion {
    fn new() -> Self {
        Self {
            state: Mutex::new(JobState::Pending),
            changed: Condvar::new(),
        }
    }

    /// Runs the job body and publishes its outcome. Panics are caught here so
    /// they surface as [`PoolError::JobPanicked`] from `wait`.
    pub(crate) fn run<F: FnOnce()>(&self, id: JobId, job: F) {
        trace!(job = %id, "job started");
        let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => JobState::Done,
            Err(_) => {
                error!(job = %id, "job panicked");
                JobState::Panicked
            }
        };
        *self.state.lock() = outcome;
        self.changed.notify_all();
        trace!(job = %id, "job finished");
    }
}

/// Table of live job handles.
#[derive(Debug, Default)]
pub(crate) struct JobTable {
    next: AtomicU64,
    slots: Mutex<HashMap<JobId, Arc<Completion>>>,
}

impl JobTable {
    /// Issues a fresh id with a pending completion slot.
    pub(crate) fn register(&self) -> (JobId, Arc<Completion>) {
        let id = JobId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        let completion = Arc::new(Completion::new());
        self.slots.lock().insert(id, Arc::clone(&completion));
        (id, completion)
    }

    fn lookup(&self, id: JobId) -> PoolResult<Arc<Completion>> {
        self.slots
            .lock()
            .get(&id)
            .cloned()
            .ok_or(PoolError::UnknownJob(id))
    }

    pub(crate) fn wait(&self, id: JobId, timeout: Timeout) -> PoolResult<()> {
        let completion = self.lookup(id)?;
        let mut state = completion.state.lock();
        match timeout {
            Timeout::Infinite => {
                while *state == JobState::Pending {
                    completion.changed.wait(&mut state);
                }
            }
            Timeout::After(limit) => {
                let deadline = Instant::now() + limit;
                while *state == JobState::Pending {
                    if completion.changed.wait_until(&mut state, deadline).timed_out()
                        && *state == JobState::Pending
                    {
                        return Err(PoolError::WaitTimeout {
                            job: id,
                            timeout: limit,
                        });
                    }
                }
            }
        }
        match *state {
            JobState::Panicked => Err(PoolError::JobPanicked(id)),
            _ => Ok(()),
        }
    }

    pub(crate) fn release(&self, id: JobId) -> PoolResult<()> {
        let mut slots = self.slots.lock();
        let completion = slots.get(&id).ok_or(PoolError::UnknownJob(id))?;
        if *completion.state.lock() == JobState::Pending {
            return Err(PoolError::JobStillRunning(id));
        }
        slots.remove(&id);
        trace!(job = %id, "job released");
        Ok(())
    }

    pub(crate) fn is_finished(&self, id: JobId) -> PoolResult<bool> {
        Ok(*self.lookup(id)?.state.lock() != JobState::Pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}
