//! Fixed-size worker pool.
//!
//! [`ThreadPool`] wraps a rayon pool with the lifecycle the host expects:
//!
//! - **create** spawns every worker up front and waits until all of them have
//!   reported in, so the first transform does not pay for thread start-up
//! - **schedule** returns a [`JobId`] immediately
//! - **wait** blocks for one job, optionally with a [`Timeout`]
//! - **release** drops the bookkeeping of a finished job
//! - **discard** tears the workers down and waits for them to exit
//!
//! Jobs that borrow caller data (row bands of a host image) go through
//! [`ThreadPool::scope`], which guarantees every job has finished before the
//! borrow ends.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace, warn};

use crate::job::JobTable;
use crate::{JobId, PoolError, PoolResult, Timeout};

/// Worker count used when zero is requested.
pub const DEFAULT_WORKERS: usize = 4;

/// How long create and discard wait for the worker census to settle.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct Counts {
    started: usize,
    exited: usize,
}

/// Worker start/exit counters fed by rayon's thread hooks.
#[derive(Debug, Default)]
struct Census {
    counts: Mutex<Counts>,
    changed: Condvar,
}

impl Census {
    fn on_start(&self) {
        self.counts.lock().started += 1;
        self.changed.notify_all();
    }

    fn on_exit(&self) {
        self.counts.lock().exited += 1;
        self.changed.notify_all();
    }

    /// Waits until `pred` holds or the deadline passes; returns the final counts.
    fn settle(&self, timeout: Duration, pred: impl Fn(&Counts) -> bool) -> (usize, usize, bool) {
        let deadline = Instant::now() + timeout;
        let mut counts = self.counts.lock();
        while !pred(&counts) {
            if self.changed.wait_until(&mut counts, deadline).timed_out() {
                break;
            }
        }
        (counts.started, counts.exited, pred(&counts))
    }
}

/// Builder for [`ThreadPool`].
///
/// # Example
///
/// ```rust
/// use mpyr_pool::PoolBuilder;
///
/// let pool = PoolBuilder::new().workers(2).name_prefix("gain").build().unwrap();
/// assert_eq!(pool.workers(), 2);
/// ```
#[derive(Clone)]
pub struct PoolBuilder {
    workers: usize,
    name_prefix: String,
    settle_timeout: Duration,
    start_hook: Option<StartHook>,
}

type StartHook = Arc<dyn Fn(usize) + Send + Sync>;

impl fmt::Debug for PoolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("workers", &self.workers)
            .field("name_prefix", &self.name_prefix)
            .field("settle_timeout", &self.settle_timeout)
            .field("start_hook", &self.start_hook.is_some())
            .finish()
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            workers: 0,
            name_prefix: "mpyr-worker".into(),
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            start_hook: None,
        }
    }
}

impl PoolBuilder {
    /// Builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested worker count; `0` selects [`DEFAULT_WORKERS`].
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Thread name prefix; workers are named `<prefix>-<index>`.
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Time allowed for all workers to start, and later to exit.
    pub fn settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Runs `hook(index)` on each worker thread before it reports as started.
    pub fn on_worker_start(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.start_hook = Some(Arc::new(hook));
        self
    }

    /// Spawns and pre-warms the workers.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Creation`] if the threads cannot be spawned
    /// - [`PoolError::WorkerCountMismatch`] if fewer workers start than requested
    pub fn build(self) -> PoolResult<ThreadPool> {
        let requested = if self.workers == 0 {
            DEFAULT_WORKERS
        } else {
            self.workers
        };
        let census = Arc::new(Census::default());
        let prefix = self.name_prefix;

        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(requested)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .start_handler({
                let census = Arc::clone(&census);
                let hook = self.start_hook;
                move |i| {
                    if let Some(hook) = &hook {
                        hook(i);
                    }
                    census.on_start();
                }
            })
            .exit_handler({
                let census = Arc::clone(&census);
                move |_| census.on_exit()
            })
            .panic_handler(|_| error!("worker panicked outside a job"))
            .build()
            .map_err(|e| PoolError::Creation {
                requested,
                reason: e.to_string(),
            })?;

        let (created, _, settled) = census.settle(self.settle_timeout, |c| c.started >= requested);
        if !settled {
            warn!(requested, created, "worker census did not settle");
            return Err(PoolError::WorkerCountMismatch { requested, created });
        }

        debug!(workers = created, "pool created");
        Ok(ThreadPool {
            inner,
            census,
            jobs: JobTable::default(),
            workers: created,
            settle_timeout: self.settle_timeout,
        })
    }
}

/// Pre-warmed pool of worker threads.
///
/// Dropping the pool stops the workers without waiting for them; use
/// [`discard`](Self::discard) to join them.
#[derive(Debug)]
pub struct ThreadPool {
    inner: rayon::ThreadPool,
    census: Arc<Census>,
    jobs: JobTable,
    workers: usize,
    settle_timeout: Duration,
}

impl ThreadPool {
    /// Creates a pool of `workers` threads (`0` selects [`DEFAULT_WORKERS`]).
    ///
    /// # Errors
    ///
    /// See [`PoolBuilder::build`].
    pub fn new(workers: usize) -> PoolResult<Self> {
        PoolBuilder::new().workers(workers).build()
    }

    /// Builder for custom settings.
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Number of workers created.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Job handles scheduled but not yet released.
    pub fn tracked_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Queues a `'static` job and returns its id without blocking.
    pub fn schedule<F>(&self, job: F) -> JobId
    where
        F: FnOnce() + Send + 'static,
    {
        let (id, completion) = self.jobs.register();
        trace!(job = %id, "job scheduled");
        self.inner.spawn(move || completion.run(id, job));
        id
    }

    /// Blocks until job `id` completes or `timeout` elapses.
    ///
    /// A timeout only stops the wait; the job keeps running and can be waited
    /// on again.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnknownJob`] for ids not issued here or already released
    /// - [`PoolError::WaitTimeout`] when the timeout elapses first
    /// - [`PoolError::JobPanicked`] when the job panicked
    pub fn wait(&self, id: JobId, timeout: impl Into<Timeout>) -> PoolResult<()> {
        self.jobs.wait(id, timeout.into())
    }

    /// Frees the bookkeeping of a finished job. The id is invalid afterwards.
    ///
    /// # Errors
    ///
    /// - [`PoolError::UnknownJob`] for unknown or already released ids
    /// - [`PoolError::JobStillRunning`] if the job has not finished
    pub fn release(&self, id: JobId) -> PoolResult<()> {
        self.jobs.release(id)
    }

    /// `true` once job `id` has run to completion (or panicked).
    pub fn is_finished(&self, id: JobId) -> PoolResult<bool> {
        self.jobs.is_finished(id)
    }

    /// Runs `op` with a [`JobScope`] for scheduling jobs that borrow from the
    /// caller. Every job scheduled in the scope has finished when this returns.
    ///
    /// The calling thread is not one of the workers; it runs `op` and then
    /// blocks until outstanding jobs are done.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mpyr_pool::{ThreadPool, Timeout};
    ///
    /// let pool = ThreadPool::new(2).unwrap();
    /// let mut halves = [vec![1; 4], vec![2; 4]];
    /// pool.scope(|s| {
    ///     let ids: Vec<_> = halves
    ///         .iter_mut()
    ///         .map(|h| s.schedule(move || h.iter_mut().for_each(|v| *v *= 10)))
    ///         .collect();
    ///     for id in ids {
    ///         s.wait(id, Timeout::Infinite).unwrap();
    ///         s.release(id).unwrap();
    ///     }
    /// });
    /// assert_eq!(halves[1], vec![20; 4]);
    /// ```
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&JobScope<'_, 'scope>) -> R,
    {
        self.inner.in_place_scope(|scope| {
            op(&JobScope {
                scope,
                jobs: &self.jobs,
            })
        })
    }

    /// Stops the workers and waits for them to exit.
    ///
    /// Returns the number of workers that exited within the settle timeout.
    /// Consuming `self` makes a second discard of the same pool impossible.
    pub fn discard(self) -> usize {
        let Self {
            inner,
            census,
            jobs,
            workers,
            settle_timeout,
        } = self;
        let pending = jobs.len();
        drop(inner);
        let (_, exited, settled) = census.settle(settle_timeout, |c| c.exited >= c.started);
        if !settled {
            warn!(workers, exited, "workers did not exit in time");
        }
        debug!(workers, exited, unreleased_jobs = pending, "pool discarded");
        exited
    }
}

/// Scheduling handle passed to [`ThreadPool::scope`].
pub struct JobScope<'p, 'scope> {
    scope: &'p rayon::Scope<'scope>,
    jobs: &'p JobTable,
}

impl<'scope> JobScope<'_, 'scope> {
    /// Queues a job that may borrow data living for `'scope`.
    pub fn schedule<F>(&self, job: F) -> JobId
    where
        F: FnOnce() + Send + 'scope,
    {
        let (id, completion) = self.jobs.register();
        trace!(job = %id, "scoped job scheduled");
        self.scope.spawn(move |_| completion.run(id, job));
        id
    }

    /// See [`ThreadPool::wait`].
    pub fn wait(&self, id: JobId, timeout: impl Into<Timeout>) -> PoolResult<()> {
        self.jobs.wait(id, timeout.into())
    }

    /// See [`ThreadPool::release`].
    pub fn release(&self, id: JobId) -> PoolResult<()> {
        self.jobs.release(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_zero_selects_default() {
        let pool = ThreadPool::new(0).unwrap();
        assert_eq!(pool.workers(), DEFAULT_WORKERS);
        assert_eq!(pool.discard(), DEFAULT_WORKERS);
    }

    #[test]
    fn test_requested_count_is_created() {
        let pool = ThreadPool::new(8).unwrap();
        assert_eq!(pool.workers(), 8);
        assert_eq!(pool.discard(), 8);
    }

    #[test]
    fn test_schedule_wait_release() {
        let pool = ThreadPool::new(2).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let ids: Vec<JobId> = (0..16)
            .map(|_| {
                let hits = Arc::clone(&hits);
                pool.schedule(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for id in &ids {
            pool.wait(*id, Timeout::Infinite).unwrap();
            pool.release(*id).unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 16);
        assert_eq!(pool.tracked_jobs(), 0);
    }

    #[test]
    fn test_wait_timeout_does_not_cancel() {
        let pool = ThreadPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel::<()>();
        let id = pool.schedule(move || {
            let _ = rx.recv();
        });
        let err = pool.wait(id, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, PoolError::WaitTimeout { .. }));
        assert_eq!(pool.release(id), Err(PoolError::JobStillRunning(id)));

        tx.send(()).unwrap();
        pool.wait(id, Timeout::Infinite).unwrap();
        assert_eq!(pool.is_finished(id), Ok(true));
        pool.release(id).unwrap();
    }

    #[test]
    fn test_panicking_job_reported() {
        let pool = ThreadPool::new(1).unwrap();
        let id = pool.schedule(|| panic!("job failure"));
        assert_eq!(pool.wait(id, Timeout::Infinite), Err(PoolError::JobPanicked(id)));
        pool.release(id).unwrap();

        // the worker survives
        let id = pool.schedule(|| {});
        assert!(pool.wait(id, Timeout::Infinite).is_ok());
    }

    #[test]
    fn test_scope_jobs_borrow() {
        let pool = ThreadPool::new(2).unwrap();
        let mut data = vec![0u32; 100];
        pool.scope(|s| {
            let (a, b) = data.split_at_mut(50);
            let ia = s.schedule(move || a.fill(1));
            let ib = s.schedule(move || b.fill(2));
            for id in [ia, ib] {
                s.wait(id, Timeout::Infinite).unwrap();
                s.release(id).unwrap();
            }
        });
        assert!(data[..50].iter().all(|&v| v == 1));
        assert!(data[50..].iter().all(|&v| v == 2));
    }

    #[test]
    fn test_workers_are_named() {
        let pool = PoolBuilder::new().workers(1).name_prefix("test-pool").build().unwrap();
        let (tx, rx) = mpsc::channel();
        let id = pool.schedule(move || {
            let _ = tx.send(std::thread::current().name().map(String::from));
        });
        pool.wait(id, Timeout::Infinite).unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("test-pool-0"));
    }
}
