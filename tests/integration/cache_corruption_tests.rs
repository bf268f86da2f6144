use std::fs;
use std::sync::Arc;

use logotext::cache::{CacheKey, TextCache, CACHE_FILE_NAME};
use logotext::scanner::Fingerprint;
use logotext::ExtractedText;
use tempfile::TempDir;

use crate::common::{extractor, write_png, MockService};

fn backups(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(&format!("{CACHE_FILE_NAME}.backup_")))
        .collect()
}

#[test]
fn test_corrupt_cache_is_moved_aside_and_rebuilt() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    fs::write(cache_dir.path().join(CACHE_FILE_NAME), "{ not json").unwrap();
    write_png(images.path(), "a.png", 1);
    let service = Arc::new(MockService::always("ACME"));

    let extractor = extractor(cache_dir.path(), &service);
    assert!(extractor.cache().is_empty());
    assert_eq!(backups(cache_dir.path()).len(), 1);

    let summary = extractor.extract_text_from_folders(&[images.path()]);
    assert_eq!(summary.success_count, 1);

    let reopened = TextCache::open(cache_dir.path());
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_non_object_cache_is_moved_aside() {
    let cache_dir = TempDir::new().unwrap();
    fs::write(cache_dir.path().join(CACHE_FILE_NAME), "[\"a\", \"b\"]").unwrap();

    let cache = TextCache::open(cache_dir.path());
    assert!(cache.is_empty());
    assert_eq!(backups(cache_dir.path()).len(), 1);
}

#[test]
fn test_invalid_entries_are_dropped_valid_ones_kept() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let logo = write_png(images.path(), "acme.png", 2);
    let fp = Fingerprint::of_file(&logo);

    let content = format!(
        r#"{{"{}": "ACME", "bogus_number": 42, "bogus_null": null, "bogus_list": ["x"]}}"#,
        fp
    );
    fs::write(cache_dir.path().join(CACHE_FILE_NAME), content).unwrap();

    let cache = TextCache::open(cache_dir.path());
    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(&CacheKey::Single(fp)),
        Some(ExtractedText::Text("ACME".to_string()))
    );
    assert!(backups(cache_dir.path()).is_empty());
}

#[test]
fn test_unwritable_cache_dir_degrades_to_memory() {
    let images = TempDir::new().unwrap();
    let blocker = TempDir::new().unwrap();
    // A regular file where the cache directory should be.
    let cache_path = blocker.path().join("cache");
    fs::write(&cache_path, "not a directory").unwrap();
    let logo = write_png(images.path(), "acme.png", 3);
    let service = Arc::new(MockService::always("ACME"));

    let extractor = extractor(&cache_path, &service);
    assert_eq!(extractor.extract_text(&logo).unwrap().as_str(), "ACME");
    assert_eq!(extractor.extract_text(&logo).unwrap().as_str(), "ACME");
    assert_eq!(service.calls(), 1);

    assert!(extractor.cache().flush().is_err());
    let summary = extractor.extract_text_from_folders(&[images.path()]);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.cached_count, 1);
}
