use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Schedule, Task};

/// FIFO macrotask queue driven by its owner.
///
/// Nothing runs until the owner calls [`tick`](TaskQueue::tick) or
/// [`run_until_idle`](TaskQueue::run_until_idle), which makes promise
/// behaviour fully deterministic. Clones share the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Runs the oldest task. Returns `false` if the queue was empty.
    pub fn tick(&self) -> bool {
        // The lock must be released before the task runs: tasks schedule more tasks.
        let task = self.tasks.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks, including ones scheduled along the way, until the queue is empty.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.tick() {
            ran += 1;
        }
        ran
    }

    /// Like [`run_until_idle`](TaskQueue::run_until_idle) but stops after `budget` tasks.
    pub fn run_budgeted(&self, budget: usize) -> usize {
        let mut ran = 0;
        while ran < budget && self.tick() {
            ran += 1;
        }
        ran
    }
}

impl Schedule for TaskQueue {
    fn schedule(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    fn name(&self) -> &'static str {
        "queue"
    }
}
