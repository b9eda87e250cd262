//! Progress persistence: load, merge, and atomic save

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::warn;

use super::state::{LastRun, ProgressState};

pub const PROGRESS_FILENAME: &str = "scrobble_progress.json";

/// Read/merge/write access to the progress file
///
/// Single writer: [`ProgressStore::lock`] must be held for the duration of a chunk run.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `state_dir`
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(PROGRESS_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current state, or an empty state if no progress file exists yet
    ///
    /// A progress file that exists but cannot be parsed is an error: starting over would
    /// re-submit every completed chunk.
    pub fn load(&self) -> Result<ProgressState> {
        if !self.path.exists() {
            return Ok(ProgressState::default());
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read progress file: {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse progress file: {}", self.path.display()))
    }

    /// Write the state atomically (temp file + rename)
    pub fn save(&self, state: &ProgressState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create progress directory: {}", parent.display())
            })?;
        }

        let temp = self.sibling("tmp");
        let json = serde_json::to_string_pretty(state).context("Failed to serialize progress")?;
        fs::write(&temp, json).context("Failed to write progress temp file")?;
        fs::rename(&temp, &self.path).context("Failed to rename progress temp file")?;
        Ok(())
    }

    /// Mark a chunk completed, merging with whatever is on disk
    pub fn record_completion(&self, index: u32, last_run: LastRun) -> Result<ProgressState> {
        let mut update = ProgressState::default();
        update.mark_completed(index, last_run);

        let mut state = self.load()?;
        state.merge(&update);
        self.save(&state)?;
        Ok(state)
    }

    /// Take the single-writer lock
    ///
    /// # Errors
    ///
    /// Fails if another run holds the lock. A lock left behind by a crashed run has to be
    /// removed by hand.
    pub fn lock(&self) -> Result<ProgressLock> {
        let path = self.sibling("lock");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create progress directory: {}", parent.display())
            })?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(ProgressLock { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
                "Another scrobble run appears to be active (lock file {} exists). \
                 Concurrent runs are not supported; remove the lock if no other run is active.",
                path.display()
            ),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to create lock file: {}", path.display())),
        }
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

/// Held while a chunk is being processed; removes the lock file on drop
#[derive(Debug)]
pub struct ProgressLock {
    path: PathBuf,
}

impl Drop for ProgressLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}
