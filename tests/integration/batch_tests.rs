use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use logotext::cache::{CacheKey, TextCache, CACHE_FILE_NAME};
use logotext::extract::ExtractorConfig;
use logotext::progress::{ProgressCallback, PHASE_EXTRACT, PHASE_LISTING};
use logotext::scanner::Fingerprint;
use logotext::{ExtractError, ExtractedText};
use tempfile::TempDir;

use crate::common::{extractor, extractor_with, write_corrupt, write_png, MockService};

#[derive(Default)]
struct RecordingProgress {
    phases: Mutex<Vec<(String, usize)>>,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
}

impl ProgressCallback for RecordingProgress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.phases.lock().unwrap().push((phase.to_string(), total));
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_item_completed(&self, success: bool) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_batch_isolates_failures() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "valid.png", 1);
    let corrupt = write_corrupt(images.path(), "corrupt.png");
    write_png(images.path(), "valid2.png", 2);
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor(cache_dir.path(), &service);

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 1);
    assert!(!summary.interrupted);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].path(), corrupt.as_path());
    assert!(matches!(summary.errors[0], ExtractError::Prepare { .. }));
    assert_eq!(service.calls(), 2);
}

#[test]
fn test_batch_filters_by_extension_and_size() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "logo.png", 1);
    write_png(images.path(), "UPPER.PNG", 2);
    fs::write(images.path().join("notes.txt"), vec![b'x'; 1024]).unwrap();
    fs::write(images.path().join("tiny.png"), vec![0u8; 50]).unwrap();
    fs::write(images.path().join("exact.jpg"), vec![0u8; 100]).unwrap();
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor(cache_dir.path(), &service);

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 0);
    assert!(summary.is_complete_success());
}

#[test]
fn test_batch_skips_missing_folder() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "logo.png", 1);
    let missing = images.path().join("does-not-exist");
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor(cache_dir.path(), &service);

    let folders: Vec<PathBuf> = vec![missing, images.path().to_path_buf()];
    let summary = extractor.extract_text_from_folders(&folders);

    assert_eq!(summary.skipped_folders, 1);
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.success_count, 1);
}

#[test]
fn test_batch_persists_cache_once_done() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "a.png", 1);
    write_png(images.path(), "b.png", 2);
    let service = Arc::new(MockService::always("ACME"));

    {
        let extractor = extractor(cache_dir.path(), &service);
        let summary = extractor.extract_text_from_folders(&[images.path()]);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.cached_count, 0);
    }
    assert!(cache_dir.path().join(CACHE_FILE_NAME).exists());

    // A fresh process sees every result without asking the service.
    let extractor = extractor(cache_dir.path(), &service);
    let summary = extractor.extract_text_from_folders(&[images.path()]);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.cached_count, 2);
    assert_eq!(service.calls(), 2);
}

#[test]
fn test_batch_with_failing_service_completes() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    for i in 0..3 {
        write_png(images.path(), &format!("logo{i}.png"), i);
    }
    let service = Arc::new(MockService::failing(429));
    let extractor = extractor(cache_dir.path(), &service);

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.fail_count, 3);
    assert!(summary.errors.iter().all(ExtractError::is_transient));
    assert!(extractor.cache().is_empty());
}

#[test]
fn test_parallel_batch_processes_every_file_once() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    for i in 0..8 {
        write_png(images.path(), &format!("logo{i}.png"), i);
    }
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor_with(
        cache_dir.path(),
        &service,
        ExtractorConfig::unpaced().with_workers(4),
    );

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert_eq!(summary.success_count, 8);
    assert_eq!(service.calls(), 8);
    assert_eq!(extractor.cache().len(), 8);
    assert!(cache_dir.path().join(CACHE_FILE_NAME).exists());
}

#[test]
fn test_shutdown_before_start_processes_nothing() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "a.png", 1);
    write_png(images.path(), "b.png", 2);
    let service = Arc::new(MockService::always("ACME"));
    let flag = Arc::new(AtomicBool::new(true));
    let extractor = extractor(cache_dir.path(), &service).with_shutdown_flag(flag);

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert!(summary.interrupted);
    assert_eq!(summary.processed(), 0);
    assert!(!summary.is_complete_success());
    assert_eq!(service.calls(), 0);
}

#[test]
fn test_shutdown_mid_batch_finishes_current_item() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let first = write_png(images.path(), "a.png", 1);
    let second = write_png(images.path(), "b.png", 2);
    write_png(images.path(), "c.png", 3);
    let flag = Arc::new(AtomicBool::new(false));
    let service = Arc::new(MockService::always("ACME").stopping_during_first_call(flag.clone()));
    let extractor = extractor(cache_dir.path(), &service).with_shutdown_flag(flag);

    let summary = extractor.extract_text_from_folders(&[images.path()]);

    assert!(summary.interrupted);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.fail_count, 0);
    assert_eq!(service.calls(), 1);

    // The in-flight item was cached and flushed despite the stop request.
    assert!(cache_dir.path().join(CACHE_FILE_NAME).exists());
    let reopened = TextCache::open(cache_dir.path());
    assert_eq!(reopened.len(), 1);
    assert_eq!(
        reopened.get(&CacheKey::Single(Fingerprint::of_file(&first))),
        Some(ExtractedText::Text("ACME".to_string()))
    );
    assert_eq!(reopened.get(&CacheKey::Single(Fingerprint::of_file(&second))), None);
}

#[test]
fn test_recursive_batch_descends_into_subfolders() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "top.png", 1);
    write_png(images.path(), "nested/deep.png", 2);
    let service = Arc::new(MockService::always("ACME"));

    let flat = extractor(cache_dir.path(), &service);
    assert_eq!(flat.extract_text_from_folders(&[images.path()]).total_files, 1);

    let recursive = extractor_with(
        cache_dir.path(),
        &service,
        ExtractorConfig::unpaced().with_recursive(true),
    );
    assert_eq!(recursive.extract_text_from_folders(&[images.path()]).total_files, 2);
}

#[test]
fn test_same_folder_twice_is_listed_once() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "a.png", 1);
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor(cache_dir.path(), &service);

    let summary = extractor.extract_text_from_folders(&[images.path(), images.path()]);

    assert_eq!(summary.total_files, 1);
    assert_eq!(service.calls(), 1);
}

#[test]
fn test_batch_reports_progress() {
    let images = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_png(images.path(), "a.png", 1);
    write_corrupt(images.path(), "b.png");
    let service = Arc::new(MockService::always("ACME"));
    let progress = Arc::new(RecordingProgress::default());
    let extractor = extractor(cache_dir.path(), &service).with_progress_callback(progress.clone());

    extractor.extract_text_from_folders(&[images.path()]);

    let phases = progress.phases.lock().unwrap().clone();
    assert_eq!(
        phases,
        vec![(PHASE_LISTING.to_string(), 1), (PHASE_EXTRACT.to_string(), 2)]
    );
    assert_eq!(progress.completed.load(Ordering::SeqCst), 2);
    assert_eq!(progress.succeeded.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_folder_list() {
    let cache_dir = TempDir::new().unwrap();
    let service = Arc::new(MockService::always("ACME"));
    let extractor = extractor(cache_dir.path(), &service);

    let summary = extractor.extract_text_from_folders::<PathBuf>(&[]);
    assert_eq!(summary.total_files, 0);
    assert!(summary.is_complete_success());
}
