use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use logotext::cli::{Cli, Commands};
use logotext::config::Config;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear every variable that feeds the config so tests do not interfere.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("LOGOTEXT_") {
            std::env::remove_var(key);
        }
    }
    std::env::remove_var("GROQ_API_KEY");
}

#[test]
fn test_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(dir.path().join("nope.toml"));
    let defaults = Config::default();
    assert_eq!(config, defaults);
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
cache_dir = "/var/cache/logotext"
model = "llava"
workers = 3
recursive = true
min_request_interval_ms = 250
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path);

    assert_eq!(config.cache_dir, PathBuf::from("/var/cache/logotext"));
    assert_eq!(config.model, "llava");
    assert_eq!(config.workers, 3);
    assert!(config.recursive);
    assert_eq!(config.request_timeout_secs, 60);

    let extractor = config.extractor_config();
    assert_eq!(extractor.min_request_interval, Duration::from_millis(250));
    assert!(extractor.walker.recursive);
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 2\nmax_dimension = 512\n").unwrap();

    std::env::set_var("LOGOTEXT_WORKERS", "6");
    let mut config = Config::load_from_path(&path);
    assert_eq!(config.workers, 6);
    assert_eq!(config.max_dimension, 512);

    let cli = Cli::try_parse_from([
        "logotext",
        "--cache-dir",
        "/tmp/elsewhere",
        "extract",
        "logos",
        "--workers",
        "9",
        "--min-size",
        "1KiB",
    ])
    .unwrap();
    config.merge_cli(&cli);
    if let Commands::Extract(ref args) = cli.command {
        config.merge_extract_args(args);
    }
    assert_eq!(config.workers, 9);
    assert_eq!(config.min_file_size, 1024);
    assert_eq!(config.cache_dir, PathBuf::from("/tmp/elsewhere"));

    clear_env();
}

#[test]
fn test_api_key_fallback() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    std::env::set_var("GROQ_API_KEY", "from-groq");
    assert_eq!(Config::load_from_path(&path).api_key, "from-groq");

    std::env::set_var("LOGOTEXT_API_KEY", "from-prefix");
    let config = Config::load_from_path(&path);
    assert_eq!(config.api_key, "from-prefix");
    assert_eq!(config.http_config().api_key, "from-prefix");

    clear_env();
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = \"many\"\n").unwrap();

    let config = Config::load_from_path(&path);
    assert_eq!(config.workers, 1);
}
