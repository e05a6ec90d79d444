//! Cooperative task scheduler.
//!
//! A single-threaded priority queue of jobs. Lower priority values run
//! first; equal priorities run in submission order.
//!
//! | Operation        | Queues | Starts a flush when idle |
//! |------------------|--------|--------------------------|
//! | `schedule`       | yes    | yes                      |
//! | `schedule_with`  | yes    | yes                      |
//! | `enqueue`        | yes    | no                       |
//! | `flush`          | no     | yes                      |
//!
//! A flush runs tasks until the queue is empty or the frame budget is
//! spent. In the second case it posts a continuation to the [`YieldHost`]
//! and returns; the host resumes the flush later. Failing tasks (an `Err`
//! return or a panic) are logged and counted, and the flush goes on.

use std::cell::{Cell, RefCell};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time a flush may run before yielding to the host
    pub frame_budget: Duration,
}

impl Default for SchedulerConfig {
    /// One frame at 60 Hz.
    fn default() -> Self {
        Self::with_budget(Duration::from_micros(16_667))
    }
}

impl SchedulerConfig {
    pub const fn with_budget(frame_budget: Duration) -> Self {
        Self { frame_budget }
    }

    /// Never yield.
    pub const fn unbounded() -> Self {
        Self::with_budget(Duration::MAX)
    }
}

// =============================================================================
// Tasks
// =============================================================================

/// Reason a task did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Return types accepted from scheduled jobs.
pub trait TaskOutcome {
    fn into_outcome(self) -> Result<(), TaskError>;
}

impl TaskOutcome for () {
    fn into_outcome(self) -> Result<(), TaskError> {
        Ok(())
    }
}

impl<E: fmt::Display> TaskOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), TaskError> {
        self.map_err(|e| TaskError::Failed(e.to_string()))
    }
}

type Job = Box<dyn FnOnce() -> Result<(), TaskError>>;

struct Task {
    priority: usize,
    seq: u64,
    job: Job,
}

impl Task {
    #[inline]
    fn key(&self) -> (usize, u64) {
        (self.priority, self.seq)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// Host
// =============================================================================

/// Host event loop the scheduler yields to.
pub trait YieldHost {
    /// Run `continuation` at some later point, outside the current flush.
    fn post(&self, continuation: Box<dyn FnOnce()>);
}

/// In-process host: posted continuations run when the owner ticks it.
#[derive(Clone, Default)]
pub struct TickQueue {
    posted: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the oldest posted continuation. Returns `false` if none.
    pub fn tick(&self) -> bool {
        let next = self.posted.borrow_mut().pop_front();
        match next {
            Some(continuation) => {
                continuation();
                true
            }
            None => false,
        }
    }

    /// Tick until nothing is posted; returns the number of ticks.
    pub fn run_until_idle(&self) -> usize {
        let mut ticks = 0;
        while self.tick() {
            ticks += 1;
        }
        ticks
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.posted.borrow().len()
    }
}

impl YieldHost for TickQueue {
    fn post(&self, continuation: Box<dyn FnOnce()>) {
        self.posted.borrow_mut().push_back(continuation);
    }
}

impl fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue").field("pending", &self.pending()).finish()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Flush state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    /// Nothing running, no continuation posted
    Idle,
    /// Inside a flush
    Flushing,
    /// Waiting for the host to resume a flush
    Yielded,
    /// Closed, every later task is ignored
    Closed,
}

/// Scheduler counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub scheduled: usize,
    pub completed: usize,
    pub failed: usize,
    pub yields: usize,
    pub dropped: usize,
}

struct Inner {
    weak: Weak<Inner>,
    queue: RefCell<BinaryHeap<Reverse<Task>>>,
    next_seq: Cell<u64>,
    state: Cell<FlushState>,
    host: RefCell<Option<Rc<dyn YieldHost>>>,
    config: SchedulerConfig,
    stats: Cell<SchedulerStats>,
}

/// Shared handle to a cooperative scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    pub fn new(host: impl YieldHost + 'static, config: SchedulerConfig) -> Self {
        let host: Rc<dyn YieldHost> = Rc::new(host);
        let inner = Rc::new_cyclic(|weak| Inner {
            weak: weak.clone(),
            queue: RefCell::new(BinaryHeap::new()),
            next_seq: Cell::new(0),
            state: Cell::new(FlushState::Idle),
            host: RefCell::new(Some(host)),
            config,
            stats: Cell::new(SchedulerStats::default()),
        });
        Self { inner }
    }

    /// Queue `job` behind everything already queued and flush if idle.
    pub fn schedule<R: TaskOutcome>(&self, job: impl FnOnce() -> R + 'static) {
        let priority = self.len();
        self.schedule_with(job, priority);
    }

    /// Queue `job` with an explicit priority and flush if idle.
    pub fn schedule_with<R: TaskOutcome>(&self, job: impl FnOnce() -> R + 'static, priority: usize) {
        if self.push(Box::new(move || job().into_outcome()), priority) {
            self.flush();
        }
    }

    /// Queue `job` without starting a flush.
    pub fn enqueue<R: TaskOutcome>(&self, job: impl FnOnce() -> R + 'static) {
        let priority = self.len();
        self.push(Box::new(move || job().into_outcome()), priority);
    }

    /// Run queued tasks now, unless a flush is running or awaiting its
    /// continuation.
    pub fn flush(&self) {
        if self.inner.state.get() == FlushState::Idle {
            self.inner.flush();
        }
    }

    /// Release the host and drop every pending task.
    pub fn close(&self) {
        if self.inner.state.replace(FlushState::Closed) == FlushState::Closed {
            return;
        }
        self.inner.host.borrow_mut().take();
        let dropped = std::mem::take(&mut *self.inner.queue.borrow_mut()).len();
        if dropped > 0 {
            tracing::warn!(dropped, "scheduler closed with pending tasks");
        }
        self.inner.update_stats(|s| s.dropped += dropped);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn state(&self) -> FlushState {
        self.inner.state.get()
    }

    #[inline]
    pub fn config(&self) -> SchedulerConfig {
        self.inner.config
    }

    #[inline]
    pub fn stats(&self) -> SchedulerStats {
        self.inner.stats.get()
    }

    /// Returns whether the task was accepted.
    fn push(&self, job: Job, priority: usize) -> bool {
        if self.inner.state.get() == FlushState::Closed {
            tracing::warn!("task scheduled after close ignored");
            return false;
        }
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        self.inner.queue.borrow_mut().push(Reverse(Task { priority, seq, job }));
        self.inner.update_stats(|s| s.scheduled += 1);
        true
    }
}

impl Inner {
    fn update_stats(&self, f: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn flush(&self) {
        self.state.set(FlushState::Flushing);
        let started = Instant::now();

        loop {
            if self.state.get() == FlushState::Closed {
                return;
            }
            // Pop before running so tasks may schedule more work
            let next = self.queue.borrow_mut().pop();
            let Some(Reverse(task)) = next else {
                break;
            };
            self.run(task);

            if self.state.get() != FlushState::Closed
                && !self.queue.borrow().is_empty()
                && started.elapsed() >= self.config.frame_budget
            {
                self.yield_to_host();
                return;
            }
        }
        if self.state.get() == FlushState::Flushing {
            self.state.set(FlushState::Idle);
        }
    }

    fn run(&self, task: Task) {
        let seq = task.seq;
        let outcome = panic::catch_unwind(AssertUnwindSafe(task.job))
            .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(()) => {
                tracing::trace!(seq, priority = task.priority, "task completed");
                self.update_stats(|s| s.completed += 1);
            }
            Err(error) => {
                tracing::error!(seq, %error, "scheduled task failed");
                self.update_stats(|s| s.failed += 1);
            }
        }
    }

    fn yield_to_host(&self) {
        let host = self.host.borrow().clone();
        let Some(host) = host else {
            self.state.set(FlushState::Idle);
            return;
        };
        self.state.set(FlushState::Yielded);
        self.update_stats(|s| s.yields += 1);
        tracing::trace!(pending = self.queue.borrow().len(), "frame budget spent, yielding");

        let weak = self.weak.clone();
        host.post(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.state.get() == FlushState::Yielded {
                    inner.flush();
                }
            }
        }));
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("pending", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
