use std::fs;

use clap::Parser;
use logotext::cache::{CacheKey, TextCache, CACHE_FILE_NAME};
use logotext::cli::Cli;
use logotext::error::ExitCode;
use logotext::scanner::Fingerprint;
use logotext::{run_app, ExtractedText};
use tempfile::TempDir;

fn cli(cache_dir: &TempDir, config_dir: &TempDir, command: &[&str]) -> Cli {
    let cache = cache_dir.path().to_string_lossy().into_owned();
    let config = config_dir
        .path()
        .join("config.toml")
        .to_string_lossy()
        .into_owned();
    let mut args = vec!["logotext", "-q", "--cache-dir", &cache, "--config", &config];
    args.extend_from_slice(command);
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_stats_on_empty_cache() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();

    let code = run_app(cli(&cache_dir, &config_dir, &["stats"])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_clear_removes_cache_file() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    {
        let cache = TextCache::open(cache_dir.path());
        let fp = Fingerprint::from_hex(&"cd".repeat(32)).unwrap();
        cache.put(&CacheKey::Single(fp), ExtractedText::Text("ACME".to_string()));
        cache.flush().unwrap();
    }
    assert!(cache_dir.path().join(CACHE_FILE_NAME).exists());

    let code = run_app(cli(&cache_dir, &config_dir, &["clear"])).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!cache_dir.path().join(CACHE_FILE_NAME).exists());
    assert!(TextCache::open(cache_dir.path()).is_empty());
}

#[test]
fn test_image_command_reports_unreadable_file() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    let bad = config_dir.path().join("broken.png");
    fs::write(&bad, vec![0u8; 512]).unwrap();
    let bad = bad.to_string_lossy().into_owned();

    let err = run_app(cli(&cache_dir, &config_dir, &["image", &bad])).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("broken.png"));
}

#[test]
fn test_validate_reports_healthy_cache() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    {
        let cache = TextCache::open(cache_dir.path());
        let fp = Fingerprint::from_hex(&"ef".repeat(32)).unwrap();
        cache.put(&CacheKey::Single(fp), ExtractedText::Text("ACME".to_string()));
        cache.flush().unwrap();
    }

    let code = run_app(cli(&cache_dir, &config_dir, &["validate"])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_validate_flags_problems_without_repairing() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join(CACHE_FILE_NAME);
    let content = r#"{"a": "ACME", "b": 42}"#;
    fs::write(&path, content).unwrap();

    let code = run_app(cli(&cache_dir, &config_dir, &["validate"])).unwrap();

    assert_eq!(code, ExitCode::GeneralError);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_validate_does_not_back_up_non_object_file() {
    let cache_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join(CACHE_FILE_NAME);
    fs::write(&path, "[1, 2, 3]").unwrap();

    let code = run_app(cli(&cache_dir, &config_dir, &["validate"])).unwrap();

    assert_eq!(code, ExitCode::GeneralError);
    assert!(path.exists());
    assert_eq!(fs::read_dir(cache_dir.path()).unwrap().count(), 1);
}
