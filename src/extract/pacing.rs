//! Global request pacing.
//!
//! Every recognition request passes through one [`RequestPacer`], so the
//! request rate stays bounded no matter how many batch workers are running.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between consecutive requests.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer that spaces requests at least `min_interval` apart.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// The configured interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next request may be sent, then claim the slot.
    ///
    /// The lock is held while sleeping so waiting workers queue up behind it
    /// instead of all waking at once.
    pub fn wait(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                log::trace!("Pacing: sleeping {:?} before next request", remaining);
                thread::sleep(remaining);
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(800))
    }
}
