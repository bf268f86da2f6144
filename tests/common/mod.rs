//! Shared fixtures: a scripted recognition service and image files.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{ImageBuffer, Rgb};
use logotext::cache::TextCache;
use logotext::extract::{ExtractorConfig, TextExtractor};
use logotext::recognition::{RecognitionError, RecognitionService};
use logotext::scanner::EncodedImage;

/// Recognition service that replays scripted answers.
///
/// Answers are consumed in order; once the script runs out every request
/// gets the fallback answer.
pub struct MockService {
    script: Mutex<VecDeque<Result<String, RecognitionError>>>,
    fallback: String,
    fail_always: Option<u16>,
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl MockService {
    /// Always answer `text`.
    pub fn always(text: &str) -> Self {
        Self::scripted(Vec::new(), text)
    }

    /// Replay `script`, then answer `fallback`.
    pub fn scripted(script: Vec<Result<String, RecognitionError>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: fallback.to_string(),
            fail_always: None,
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
            stop_flag: None,
        }
    }

    /// Fail every request with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_always: Some(status),
            ..Self::always("")
        }
    }

    /// Raise `flag` while answering the first request, as Ctrl+C would.
    pub fn stopping_during_first_call(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

impl RecognitionService for MockService {
    fn recognize(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<String, RecognitionError> {
        assert!(!image.base64.is_empty(), "service received an empty payload");
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            if let Some(ref flag) = self.stop_flag {
                flag.store(true, Ordering::SeqCst);
            }
        }
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());

        if let Some(status) = self.fail_always {
            return Err(RecognitionError::Status {
                status,
                body: "mock failure".to_string(),
            });
        }

        match self.script.lock().unwrap().pop_front() {
            Some(answer) => answer,
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Shorthand for a scripted service error.
pub fn service_error() -> Result<String, RecognitionError> {
    Err(RecognitionError::Status {
        status: 503,
        body: "unavailable".to_string(),
    })
}

/// Build an unpaced extractor over a cache in `cache_dir`.
pub fn extractor(cache_dir: &Path, service: &Arc<MockService>) -> TextExtractor {
    extractor_with(cache_dir, service, ExtractorConfig::unpaced())
}

pub fn extractor_with(
    cache_dir: &Path,
    service: &Arc<MockService>,
    config: ExtractorConfig,
) -> TextExtractor {
    let cache = Arc::new(TextCache::open(cache_dir));
    let service: Arc<dyn RecognitionService> = service.clone();
    TextExtractor::new(cache, service, config)
}

/// Write a 64x64 noisy PNG. Noise keeps the file well above the minimum size.
pub fn write_png(dir: &Path, name: &str, seed: u32) -> PathBuf {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let img = ImageBuffer::from_fn(64, 64, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let [a, b, c, _] = state.to_le_bytes();
        Rgb([a, b, c])
    });

    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    img.save_with_format(&path, image::ImageFormat::Png).unwrap();
    path
}

/// Write a file with an image extension that is not an image.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0xAB; 512]).unwrap();
    path
}
