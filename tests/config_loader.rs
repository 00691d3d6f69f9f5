use deferred::{ConfigError, Engine, EngineConfig, EngineError, SchedulerKind};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Test that EngineConfig::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = EngineConfig::default();

    assert_eq!(config.scheduler.kind, SchedulerKind::Auto);
    assert_eq!(config.scheduler.drain_budget, 100_000);
    assert_eq!(config.logging.filter, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = EngineConfig::config_path();
    assert!(path.ends_with("deferred/config.toml"));
}

#[test]
fn test_load_valid_file() {
    let (_dir, path) = write_config(
        r#"
[scheduler]
kind = "queue"
drain_budget = 500

[logging]
filter = "deferred=trace,warn"
"#,
    );

    let config = EngineConfig::load_from(&path).unwrap();
    assert_eq!(config.scheduler.kind, SchedulerKind::Queue);
    assert_eq!(config.scheduler.drain_budget, 500);
    assert_eq!(config.logging.filter, "deferred=trace,warn");
}

/// Missing sections fall back to defaults.
#[test]
fn test_load_partial_file() {
    let (_dir, path) = write_config("[scheduler]\nkind = \"tokio\"\n");

    let config = EngineConfig::load_from(&path).unwrap();
    assert_eq!(config.scheduler.kind, SchedulerKind::Tokio);
    assert_eq!(config.scheduler.drain_budget, 100_000);
    assert_eq!(config.logging.filter, "info");
}

#[test]
fn test_load_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = EngineConfig::load_from(&path);
    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_load_invalid_toml_is_parse_error() {
    let (_dir, path) = write_config("[scheduler\nkind = ");

    let err = EngineConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("config.toml"), "got: {err}");
}

#[test]
fn test_unknown_scheduler_kind_is_parse_error() {
    let (_dir, path) = write_config("[scheduler]\nkind = \"threads\"\n");

    let result = EngineConfig::load_from(&path);
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_zero_drain_budget_fails_validation() {
    let (_dir, path) = write_config("[scheduler]\ndrain_budget = 0\n");

    let err = EngineConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
    assert!(err.to_string().contains("drain_budget"), "got: {err}");
}

#[test]
fn test_bad_log_filter_fails_validation() {
    let mut config = EngineConfig::default();
    config.logging.filter = "deferred=verbose".to_string();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("logging.filter"), "got: {err}");
}

/// Test the real user flow: write TOML, load it, build an engine from it.
#[test]
fn test_engine_from_loaded_config() {
    let (_dir, path) = write_config("[scheduler]\nkind = \"queue\"\ndrain_budget = 3\n");
    let config = EngineConfig::load_from(&path).unwrap();

    let engine = Engine::new(config).unwrap();
    assert!(!engine.is_host_native());
    assert_eq!(engine.config().scheduler.drain_budget, 3);
}

/// `from_config_file` reads `deferred/config.toml` under the platform config dir.
#[cfg(target_os = "linux")]
#[test]
fn test_engine_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("deferred")).unwrap();
    std::fs::write(
        dir.path().join("deferred").join("config.toml"),
        "[scheduler]\nkind = \"queue\"\ndrain_budget = 7\n",
    )
    .unwrap();
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let engine = Engine::from_config_file().unwrap();
    assert!(!engine.is_host_native());
    assert_eq!(engine.config().scheduler.drain_budget, 7);
}

/// An invalid config is rejected when building an engine directly.
#[test]
fn test_engine_rejects_invalid_config() {
    let mut config = EngineConfig::default();
    config.scheduler.drain_budget = 0;

    let result = Engine::new(config);
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[test]
fn test_config_roundtrip() {
    let mut config = EngineConfig::default();
    config.scheduler.kind = SchedulerKind::Queue;
    config.logging.filter = "debug".to_string();

    let serialized = toml::to_string(&config).unwrap();
    let parsed: EngineConfig = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed, config);
}
