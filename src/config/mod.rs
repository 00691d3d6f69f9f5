//! Engine configuration.
//!
//! Settings live in a TOML file under the platform config directory. Every
//! field has a default, so a missing file or a partial file is fine.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{EngineConfig, LoggingConfig, SchedulerConfig, SchedulerKind};
