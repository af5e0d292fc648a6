//! Integration tests for loading configuration from disk.

use std::fs;

use tempfile::TempDir;
use tugtype_core::config::{Config, PythonVersion};
use tugtype_core::error::ConfigError;

#[test]
fn load_reads_toml_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tugtype.toml");
    fs::write(
        &path,
        "[aligner]\npython_version = \"3.6\"\n\n[callgraph]\nmodule_id = \"<module>\"\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.aligner.python_version, PythonVersion::new(3, 6));
    assert_eq!(config.callgraph.module_id, "<module>");
}

#[test]
fn load_or_default_without_file() {
    let temp = TempDir::new().unwrap();
    let config = Config::load_or_default(&temp.path().join("missing.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn load_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(&temp.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn load_rejects_bad_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tugtype.toml");
    fs::write(&path, "[aligner\n").unwrap();
    assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
}
