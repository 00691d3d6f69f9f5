//! The "run later" hook used by the notification step.
//!
//! A promise never notifies its waiters synchronously; it hands a task to a
//! [`Scheduler`] instead. Two implementations ship with the crate: the
//! caller-driven [`TaskQueue`] and the tokio-backed [`TokioSchedule`].

mod host;
mod queue;

use std::fmt;
use std::sync::Arc;

pub use host::TokioSchedule;
pub use queue::TaskQueue;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks in a later turn than the one that scheduled them.
pub trait Schedule: Send + Sync {
    /// Enqueues a task. Must not run it before returning.
    fn schedule(&self, task: Task);

    /// Short name used in log fields.
    fn name(&self) -> &'static str;
}

/// Cheap, cloneable handle to a [`Schedule`] implementation.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<dyn Schedule>,
}

impl Scheduler {
    pub fn new<S: Schedule + 'static>(schedule: S) -> Self {
        Self {
            inner: Arc::new(schedule),
        }
    }

    /// Schedules `task` to run in a later turn.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.schedule(Box::new(task));
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scheduler").field(&self.name()).finish()
    }
}

impl From<TaskQueue> for Scheduler {
    fn from(queue: TaskQueue) -> Self {
        Scheduler::new(queue)
    }
}

impl From<TokioSchedule> for Scheduler {
    fn from(host: TokioSchedule) -> Self {
        Scheduler::new(host)
    }
}
