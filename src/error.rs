//! Error types shared across the engine.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::promise::PromiseId;

/// Programming mistakes that cannot be expressed as a rejection.
///
/// These are raised synchronously (as a panic from the non-`try_` entry
/// points) so that no `catch` further down a chain can swallow them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A promise was resolved with itself.
    #[error("{id} settled with itself")]
    SelfResolution { id: PromiseId },
}

/// Errors raised while building or driving an [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tokio scheduler was requested outside of a runtime.
    #[error("Scheduler 'tokio' requested but no tokio runtime is running")]
    NoRuntime,

    /// The fallback queue still had work after running `budget` tasks.
    #[error("Task queue not idle after {budget} tasks ({remaining} still queued)")]
    DrainBudgetExhausted { budget: usize, remaining: usize },
}

/// Failure when awaiting a promise as a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwaitError<E> {
    /// The promise was rejected with this reason.
    Rejected(E),
    /// Every handle that could settle the promise was dropped while it was pending.
    Abandoned,
}

impl<E> AwaitError<E> {
    /// Returns the rejection reason, if any.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            AwaitError::Rejected(reason) => Some(reason),
            AwaitError::Abandoned => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for AwaitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwaitError::Rejected(reason) => write!(f, "Promise rejected: {}", reason),
            AwaitError::Abandoned => write!(f, "Promise dropped before it settled"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AwaitError<E> {}
