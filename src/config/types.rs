use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which scheduler backs the notification step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// Use the tokio runtime if one is running, otherwise the task queue.
    #[default]
    Auto,
    /// Always use the caller-driven task queue.
    Queue,
    /// Always use the tokio runtime; fails outside of one.
    Tokio,
}

/// Scheduler selection and queue limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduler to use (default: auto).
    #[serde(default)]
    pub kind: SchedulerKind,
    /// Max tasks run by a single `Engine::run_until_idle` call (default: 100000).
    #[serde(default = "default_drain_budget")]
    pub drain_budget: usize,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_drain_budget() -> usize {
    100_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            kind: SchedulerKind::default(),
            drain_budget: default_drain_budget(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
