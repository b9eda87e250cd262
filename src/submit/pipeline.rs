//! Chunk submission: batching, fallback, pacing, and progress
//!
//! A chunk moves through [`ChunkState`]s: it is discovered on disk, previewed for the operator,
//! submitted batch by batch, and finally marked complete in the progress file. Marking happens
//! even when some songs failed; those songs are written to `failed_songs_part{i}.json` for
//! manual follow-up and are not retried by later runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::chunks::chunk_file_name;
use super::config::PipelineConfig;
use super::remote::{Scrobble, Scrobbler};
use super::timing::{Clock, Pacer, SystemClock, ThreadPacer};
use crate::models::CanonicalRecord;
use crate::parsers::{ChunkContents, read_chunk_file};
use crate::progress::{LastRun, ProgressState, ProgressStore};

/// Synthetic timestamps for a batch of `len` songs
///
/// Song `i` is placed `i * spacing_secs` before `now`, as if the batch had been played back to
/// back going backwards from the present. Every batch starts again from its own `now`, so
/// consecutive batches overlap in time.
pub fn batch_timestamps(now: i64, len: usize, spacing_secs: i64) -> Vec<i64> {
    (0..len as i64).map(|i| now - i * spacing_secs).collect()
}

/// Lifecycle of one chunk within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Discovered,
    AwaitingConfirmation,
    InProgress,
    /// Every song was accepted
    Completed,
    /// Finished, but some songs were never accepted; still marked complete
    PartiallyFailed,
}

/// What the operator sees before confirming a chunk
#[derive(Debug, Clone)]
pub struct ChunkPreview {
    pub index: u32,
    pub file_name: String,
    pub total_songs: usize,
    pub total_batches: usize,
    pub sample: Vec<CanonicalRecord>,
    pub problem_lines: usize,
    pub problem_file: Option<PathBuf>,
}

/// Result of submitting one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Songs the service accepted
    pub submitted: usize,
    /// Songs that were never accepted
    pub failed: Vec<CanonicalRecord>,
    pub used_fallback: bool,
}

impl BatchOutcome {
    /// A batch counts as successful when at least one of its songs went through
    pub fn is_success(&self) -> bool {
        self.submitted > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub total_batches: usize,
    pub successful_batches: usize,
    pub songs_scrobbled: usize,
    pub failed_songs: Vec<CanonicalRecord>,
}

#[derive(Debug, Clone)]
pub struct ChunkReport {
    pub index: u32,
    pub file_name: String,
    pub state: ChunkState,
    pub total_songs: usize,
    pub summary: SubmissionSummary,
    pub problem_lines: usize,
    pub failed_file: Option<PathBuf>,
    pub progress: ProgressState,
}

/// How a chunk run ended
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// No chunk file with that index
    Missing(PathBuf),
    /// The chunk file held no usable songs
    Empty(PathBuf),
    /// The operator declined at the confirmation prompt
    Cancelled,
    Finished(ChunkReport),
}

/// A chunk read from disk, with its problem lines already persisted
#[derive(Debug, Clone)]
pub struct LoadedChunk {
    pub index: u32,
    pub path: PathBuf,
    pub file_name: String,
    pub contents: ChunkContents,
    pub problem_file: Option<PathBuf>,
}

/// Read chunk `index`, writing its problem lines to a side file if there are any
///
/// Returns `None` when the chunk file does not exist.
pub fn load_chunk(config: &PipelineConfig, index: u32) -> Result<Option<LoadedChunk>> {
    let file_name = chunk_file_name(index);
    let path = config.chunk_dir.join(&file_name);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = read_chunk_file(&path)?;
    info!("Loaded {} songs from {}", contents.songs.len(), path.display());

    let problem_file = if contents.problems.is_empty() {
        None
    } else {
        let problem_file = config.problem_file(&file_name);
        write_json(&problem_file, &contents.problems)?;
        warn!(
            "Skipped {} problematic lines in {}; saved to {}",
            contents.problems.len(),
            file_name,
            problem_file.display()
        );
        Some(problem_file)
    };

    Ok(Some(LoadedChunk { index, path, file_name, contents, problem_file }))
}

/// Read a chunk for review without submitting anything or touching progress
pub fn inspect_chunk(config: &PipelineConfig, index: u32) -> Result<Option<LoadedChunk>> {
    load_chunk(config, index)
}

/// Drives chunk submission against a [`Scrobbler`]
pub struct Submitter<S, P = ThreadPacer, C = SystemClock> {
    scrobbler: S,
    pacer: P,
    clock: C,
    config: PipelineConfig,
}

impl<S: Scrobbler> Submitter<S> {
    /// Submitter with real sleeps and the system clock
    pub fn new(scrobbler: S, config: PipelineConfig) -> Self {
        Self::with_timing(scrobbler, ThreadPacer, SystemClock, config)
    }
}

impl<S: Scrobbler, P: Pacer, C: Clock> Submitter<S, P, C> {
    pub fn with_timing(scrobbler: S, pacer: P, clock: C, config: PipelineConfig) -> Self {
        Self { scrobbler, pacer, clock, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scrobbler(&self) -> &S {
        &self.scrobbler
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Submit one batch in a single call, falling back to one call per song on failure
    pub fn submit_batch(
        &mut self,
        batch: &[CanonicalRecord],
        batch_num: usize,
        total_batches: usize,
    ) -> BatchOutcome {
        let timestamps = batch_timestamps(self.clock.now(), batch.len(), self.config.spacing_secs);
        let scrobbles: Vec<Scrobble> =
            batch.iter().zip(timestamps).map(|(song, ts)| Scrobble::new(song, ts)).collect();

        match self.scrobbler.scrobble_many(&scrobbles) {
            Ok(()) => {
                info!(
                    "Batch {}/{} scrobbled successfully ({} songs)",
                    batch_num,
                    total_batches,
                    batch.len()
                );
                BatchOutcome { submitted: batch.len(), ..Default::default() }
            }
            Err(e) => {
                warn!("Error scrobbling batch {}: {}; retrying songs individually", batch_num, e);
                self.submit_individually(batch, batch_num)
            }
        }
    }

    fn submit_individually(&mut self, batch: &[CanonicalRecord], batch_num: usize) -> BatchOutcome {
        let timestamps = batch_timestamps(self.clock.now(), batch.len(), self.config.spacing_secs);
        let mut outcome = BatchOutcome { used_fallback: true, ..Default::default() };

        for (i, (song, ts)) in batch.iter().zip(timestamps).enumerate() {
            match self.scrobbler.scrobble(&Scrobble::new(song, ts)) {
                Ok(()) => {
                    outcome.submitted += 1;
                    debug!("Scrobbled: {} - {}", song.artist, song.track);
                }
                Err(e) => {
                    warn!("Failed: {} - {} ({})", song.artist, song.track, e);
                    outcome.failed.push(song.clone());
                }
            }
            if i + 1 < batch.len() {
                self.pacer.pause(self.config.individual_delay);
            }
        }

        info!(
            "Batch {}: {}/{} songs scrobbled individually",
            batch_num,
            outcome.submitted,
            batch.len()
        );
        outcome
    }

    /// Submit songs in file order, in batches, pausing between batches
    pub fn submit_songs(&mut self, songs: &[CanonicalRecord]) -> SubmissionSummary {
        let batch_size = self.config.effective_batch_size();
        let total_batches = songs.len().div_ceil(batch_size);
        let mut summary = SubmissionSummary { total_batches, ..Default::default() };

        for (i, batch) in songs.chunks(batch_size).enumerate() {
            let start = i * batch_size;
            debug!("Processing songs {} to {}", start + 1, start + batch.len());

            let outcome = self.submit_batch(batch, i + 1, total_batches);
            if outcome.is_success() {
                summary.successful_batches += 1;
            }
            summary.songs_scrobbled += outcome.submitted;
            summary.failed_songs.extend(outcome.failed);

            if i + 1 < total_batches {
                debug!("Waiting {:?} before next batch", self.config.batch_delay);
                self.pacer.pause(self.config.batch_delay);
            }
        }

        summary
    }

    /// Run one chunk end to end
    ///
    /// `confirm` is shown a preview and decides whether submission starts. Progress is only
    /// written once every batch has been attempted; a missing or empty chunk, or a declined
    /// confirmation, leaves it untouched.
    ///
    /// # Errors
    ///
    /// Fails if another run holds the progress lock, if the chunk or its problem-line file
    /// cannot be read or written, or if progress cannot be saved. Failing to write the
    /// failed-songs file is only logged.
    pub fn process_chunk<F>(
        &mut self,
        index: u32,
        store: &ProgressStore,
        confirm: F,
    ) -> Result<ChunkOutcome>
    where
        F: FnOnce(&ChunkPreview) -> Result<bool>,
    {
        let _lock = store.lock()?;

        let Some(chunk) = load_chunk(&self.config, index)? else {
            let path = self.config.chunk_dir.join(chunk_file_name(index));
            warn!("File not found: {}", path.display());
            return Ok(ChunkOutcome::Missing(path));
        };
        debug!(index, state = ?ChunkState::Discovered, "chunk loaded");

        let songs = &chunk.contents.songs;
        if songs.is_empty() {
            warn!("No songs to scrobble in {}", chunk.path.display());
            return Ok(ChunkOutcome::Empty(chunk.path));
        }

        let preview = ChunkPreview {
            index,
            file_name: chunk.file_name.clone(),
            total_songs: songs.len(),
            total_batches: songs.len().div_ceil(self.config.effective_batch_size()),
            sample: songs.iter().take(self.config.preview_len).cloned().collect(),
            problem_lines: chunk.contents.problems.len(),
            problem_file: chunk.problem_file.clone(),
        };
        debug!(index, state = ?ChunkState::AwaitingConfirmation, "waiting for confirmation");
        if !confirm(&preview)? {
            info!("Cancelled by user");
            return Ok(ChunkOutcome::Cancelled);
        }

        debug!(index, state = ?ChunkState::InProgress, "submitting");
        let summary = self.submit_songs(songs);

        let at = Local.timestamp_opt(self.clock.now(), 0).single().unwrap_or_else(Local::now);
        let progress = store.record_completion(index, LastRun::new(&chunk.file_name, at))?;

        // Completion is recorded first; the failed-songs file is best effort.
        let failed_file = if summary.failed_songs.is_empty() {
            None
        } else {
            let failed_file = self.config.failed_file(index);
            match write_json(&failed_file, &summary.failed_songs) {
                Ok(()) => Some(failed_file),
                Err(e) => {
                    warn!("Could not save {} failed songs: {:#}", summary.failed_songs.len(), e);
                    None
                }
            }
        };

        let state = if summary.failed_songs.is_empty() {
            ChunkState::Completed
        } else {
            ChunkState::PartiallyFailed
        };
        debug!(index, ?state, "chunk finished");

        Ok(ChunkOutcome::Finished(ChunkReport {
            index,
            file_name: chunk.file_name,
            state,
            total_songs: songs.len(),
            summary,
            problem_lines: chunk.contents.problems.len(),
            failed_file,
            progress,
        }))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize side file")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
