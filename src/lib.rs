//! A promise engine with pluggable scheduling.
//!
//! [`Promise`] is a container for a value or failure that is not known yet:
//! it settles once, runs continuations registered with the `then` family in
//! order, and adopts the outcome of any [`Thenable`] it is resolved with.
//! Continuations always run in a later turn, handed to a [`Scheduler`].
//!
//! [`Engine`] picks the scheduler: the tokio runtime when one is running,
//! otherwise a [`TaskQueue`] that the caller drains.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod promise;
pub mod scheduler;

pub use config::{ConfigError, EngineConfig, LoggingConfig, SchedulerConfig, SchedulerKind};
pub use engine::Engine;
pub use error::{AwaitError, EngineError, UsageError};
pub use logging::init_tracing;
pub use promise::{
    Callback, Promise, PromiseId, PromiseState, Resolution, Resolver, Settlement, Thenable,
};
pub use scheduler::{Schedule, Scheduler, Task, TaskQueue, TokioSchedule};
