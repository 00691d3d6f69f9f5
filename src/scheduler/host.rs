use tokio::runtime::Handle;

use super::{Schedule, Task};

/// Host-native scheduler: every task is spawned onto a tokio runtime.
///
/// On a multi-threaded runtime tasks may run on different workers; promises
/// keep per-instance ordering themselves.
#[derive(Clone, Debug)]
pub struct TokioSchedule {
    handle: Handle,
}

impl TokioSchedule {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Returns the scheduler for the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Schedule for TokioSchedule {
    fn schedule(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}
