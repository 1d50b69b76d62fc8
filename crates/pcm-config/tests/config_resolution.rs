//! Configuration validation + resolution tests against real files.
//!
//! Covers:
//! - Resolution order (CLI > PCM_CONFIG > PCM_CONFIG_DIR)
//! - Semantic validation of loaded files
//! - Snapshot provenance

use pcm_config::resolve::{ENV_CONFIG_DIR, ENV_CONFIG_PATH};
use pcm_config::{load_config, resolve_config, ConfigSource, MinerConfig, ValidationError};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

fn write_config(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    fs::write(path, body).expect("write config");
}

#[test]
fn cli_path_beats_environment() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let cli = dir.path().join("cli.json");
        let env_file = dir.path().join("env.json");
        write_config(&cli, r#"{"max_length": 7}"#);
        write_config(&env_file, r#"{"max_length": 9}"#);
        env::set_var(ENV_CONFIG_PATH, &env_file);

        let resolved = resolve_config(Some(&cli));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(load_config(Some(&cli)).unwrap().config.max_length, 7);
    });
}

#[test]
fn env_path_used_when_cli_missing() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let env_file = dir.path().join("env.json");
        write_config(&env_file, r#"{"overlap": true}"#);
        env::set_var(ENV_CONFIG_PATH, &env_file);

        let missing = dir.path().join("does-not-exist.json");
        let loaded = load_config(Some(&missing)).unwrap();
        assert!(loaded.config.overlap);
        assert_eq!(loaded.snapshot.config_source, "environment variable");
    });
}

#[test]
fn config_dir_env_is_consulted() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        env::remove_var(ENV_CONFIG_PATH);
        let dir = TempDir::new().unwrap();
        write_config(&dir.path().join("miner.json"), r#"{"min_length": 3}"#);
        env::set_var(ENV_CONFIG_DIR, dir.path());

        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(load_config(None).unwrap().config.min_length, 3);
    });
}

#[test]
fn semantic_errors_surface_field_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    write_config(&path, r#"{"max_length": 5, "min_length": 6}"#);

    match load_config(Some(&path)) {
        Err(ValidationError::InvalidValue { field, .. }) => assert_eq!(field, "min_length"),
        other => panic!("expected invalid min_length, got {other:?}"),
    }
}

#[test]
fn unknown_schema_version_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.json");
    write_config(&path, r#"{"schema_version": "0.1.0"}"#);

    assert!(matches!(
        MinerConfig::load(&path),
        Err(ValidationError::VersionMismatch { .. })
    ));
}
