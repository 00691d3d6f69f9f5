//! Scheduler selection and promise construction.
//!
//! An [`Engine`] decides once, when it is built, whether promises run on the
//! host's tokio runtime or on a fallback [`TaskQueue`] that the owner drives
//! with [`Engine::run_until_idle`].

use uuid::Uuid;

use crate::config::{EngineConfig, SchedulerKind};
use crate::error::EngineError;
use crate::promise::{Promise, Resolution, Resolver};
use crate::scheduler::{Scheduler, TaskQueue, TokioSchedule};

pub struct Engine {
    id: Uuid,
    config: EngineConfig,
    scheduler: Scheduler,
    /// Present only when running on the fallback queue.
    queue: Option<TaskQueue>,
}

impl Engine {
    /// Builds an engine from `config`.
    ///
    /// # Errors
    /// Returns an error if the config is invalid, or if the tokio scheduler
    /// is requested outside of a tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let (scheduler, queue) = match (config.scheduler.kind, TokioSchedule::current()) {
            (SchedulerKind::Auto, Some(host)) | (SchedulerKind::Tokio, Some(host)) => {
                (Scheduler::from(host), None)
            }
            (SchedulerKind::Auto, None) | (SchedulerKind::Queue, _) => {
                let queue = TaskQueue::new();
                (Scheduler::from(queue.clone()), Some(queue))
            }
            (SchedulerKind::Tokio, None) => return Err(EngineError::NoRuntime),
        };

        Ok(Self::assemble(config, scheduler, queue))
    }

    /// Uses the host runtime when present, the fallback queue otherwise.
    pub fn detect() -> Self {
        match TokioSchedule::current() {
            Some(host) => Self::assemble(EngineConfig::default(), Scheduler::from(host), None),
            None => {
                let queue = TaskQueue::new();
                Self::assemble(
                    EngineConfig::default(),
                    Scheduler::from(queue.clone()),
                    Some(queue),
                )
            }
        }
    }

    /// Builds an engine from the config file at [`EngineConfig::config_path`].
    pub fn from_config_file() -> Result<Self, EngineError> {
        Self::new(EngineConfig::load()?)
    }

    fn assemble(config: EngineConfig, scheduler: Scheduler, queue: Option<TaskQueue>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(engine = %id, scheduler = scheduler.name(), "engine ready");
        Self {
            id,
            config,
            scheduler,
            queue,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// True when promises run on the host runtime rather than the fallback queue.
    pub fn is_host_native(&self) -> bool {
        self.queue.is_none()
    }

    /// The fallback queue, if this engine owns one.
    pub fn queue(&self) -> Option<&TaskQueue> {
        self.queue.as_ref()
    }

    /// Drains the fallback queue, running at most `drain_budget` tasks.
    ///
    /// Returns the number of tasks run; always 0 on the host runtime, which
    /// drives itself.
    pub fn run_until_idle(&self) -> Result<usize, EngineError> {
        let Some(queue) = &self.queue else {
            return Ok(0);
        };

        let budget = self.config.scheduler.drain_budget;
        let ran = queue.run_budgeted(budget);
        if ran == budget && !queue.is_empty() {
            let remaining = queue.len();
            tracing::warn!(engine = %self.id, budget, remaining, "task queue not idle after drain budget");
            return Err(EngineError::DrainBudgetExhausted { budget, remaining });
        }
        Ok(ran)
    }

    pub fn promise<T, E, F>(&self, executor: F) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        Promise::new(&self.scheduler, executor)
    }

    pub fn pending<T, E>(&self) -> (Promise<T, E>, Resolver<T, E>)
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
    {
        Promise::pending(&self.scheduler)
    }

    pub fn resolve<T, E>(&self, value: T) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
    {
        Promise::resolve(&self.scheduler, value)
    }

    pub fn resolve_with<T, E>(&self, resolution: Resolution<T, E>) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
    {
        Promise::resolve_with(&self.scheduler, resolution)
    }

    pub fn reject<T, E>(&self, reason: E) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
    {
        Promise::reject(&self.scheduler, reason)
    }

    pub fn all<T, E, I>(&self, items: I) -> Promise<Vec<T>, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        I: IntoIterator<Item = Resolution<T, E>>,
    {
        Promise::all(&self.scheduler, items)
    }

    pub fn race<T, E, I>(&self, items: I) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        I: IntoIterator<Item = Resolution<T, E>>,
    {
        Promise::race(&self.scheduler, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;

    fn config(kind: SchedulerKind, drain_budget: usize) -> EngineConfig {
        EngineConfig {
            scheduler: SchedulerConfig { kind, drain_budget },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_detect_outside_runtime_uses_queue() {
        let engine = Engine::detect();
        assert!(!engine.is_host_native());
        assert_eq!(engine.scheduler().name(), "queue");
        assert!(engine.queue().is_some());
    }

    #[test]
    fn test_tokio_kind_requires_runtime() {
        let result = Engine::new(config(SchedulerKind::Tokio, 10));
        assert!(matches!(result, Err(EngineError::NoRuntime)));
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let result = Engine::new(config(SchedulerKind::Queue, 0));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_auto_inside_runtime_is_host_native() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(engine.is_host_native());
        assert_eq!(engine.scheduler().name(), "tokio");
        assert_eq!(engine.run_until_idle().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_queue_kind_inside_runtime_stays_on_queue() {
        let engine = Engine::new(config(SchedulerKind::Queue, 10)).unwrap();
        assert!(!engine.is_host_native());
    }

    #[test]
    fn test_run_until_idle_respects_budget() {
        let engine = Engine::new(config(SchedulerKind::Queue, 3)).unwrap();
        for _ in 0..5 {
            engine.scheduler().schedule(|| {});
        }

        match engine.run_until_idle() {
            Err(EngineError::DrainBudgetExhausted { budget, remaining }) => {
                assert_eq!(budget, 3);
                assert_eq!(remaining, 2);
            }
            other => panic!("Expected DrainBudgetExhausted, got {:?}", other),
        }
        assert_eq!(engine.run_until_idle().unwrap(), 2);
    }
}
