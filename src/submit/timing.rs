//! Time sources and pacing, injectable so the pipeline can run without real sleeps

use std::thread;
use std::time::Duration;

use chrono::Utc;

/// Source of "now" for synthetic timestamps
pub trait Clock {
    /// Current time in Unix seconds
    fn now(&self) -> i64;
}

/// Waits between remote calls to stay under the service's rate limit
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Blocks the current thread for the full duration
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
