//! Persistent scrobble progress
//!
//! Tracks which chunk files have been attempted so a later run picks up where the last one
//! stopped. Uses a single JSON file (default `scrobble_progress.json`):
//!
//! ```json
//! {
//!   "completed": [0, 1, 2],
//!   "last_run": { "file": "part2.csv", "date": "2025-03-01T10:00:00+00:00", "timestamp": 1740823200 }
//! }
//! ```
//!
//! `completed` only ever grows. Writes are atomic (temp file + rename) and a lock file next to
//! the progress file rejects a second concurrent run; concurrent runs are not supported.

pub mod state;
pub mod store;

pub use state::{LastRun, ProgressState};
pub use store::{PROGRESS_FILENAME, ProgressLock, ProgressStore};
