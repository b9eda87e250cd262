//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scrobble_history::submit::{Clock, Pacer, PipelineConfig, Scrobble, Scrobbler, SubmitError};
use tempfile::TempDir;

pub const NOW: i64 = 1_700_000_000;

/// Builder for a directory of listening-history export files
pub struct ExportDirBuilder {
    temp_dir: TempDir,
}

impl ExportDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add an export file with raw content
    pub fn with_file(self, name: &str, content: &str) -> Self {
        fs::write(self.temp_dir.path().join(name), content).expect("Failed to write export file");
        self
    }

    /// Add an export file holding one JSON array of plays
    pub fn with_plays(self, name: &str, plays: &[PlayBuilder]) -> Self {
        let content = format!(
            "[{}]",
            plays.iter().map(PlayBuilder::to_json).collect::<Vec<_>>().join(",\n")
        );
        self.with_file(name, &content)
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for ExportDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one play in the account-data export schema
pub struct PlayBuilder {
    artist: String,
    track: String,
    ms_played: Option<i64>,
    extended: bool,
}

impl PlayBuilder {
    pub fn new(artist: &str, track: &str) -> Self {
        Self {
            artist: artist.to_string(),
            track: track.to_string(),
            ms_played: Some(60_000),
            extended: false,
        }
    }

    pub fn ms_played(mut self, ms: i64) -> Self {
        self.ms_played = Some(ms);
        self
    }

    pub fn unknown_duration(mut self) -> Self {
        self.ms_played = None;
        self
    }

    /// Use the extended streaming-history key names
    pub fn extended(mut self) -> Self {
        self.extended = true;
        self
    }

    pub fn to_json(&self) -> String {
        let mut map = serde_json::Map::new();
        let (artist_key, track_key, ms_key) = if self.extended {
            ("master_metadata_album_artist_name", "master_metadata_track_name", "ms_played")
        } else {
            ("artistName", "trackName", "msPlayed")
        };
        map.insert(artist_key.to_string(), self.artist.clone().into());
        map.insert(track_key.to_string(), self.track.clone().into());
        if let Some(ms) = self.ms_played {
            map.insert(ms_key.to_string(), ms.into());
        }
        serde_json::Value::Object(map).to_string()
    }
}

/// `n` plays named `Artist {i}` / `Track {i}`, each long enough for any sane threshold
pub fn numbered_plays(n: usize) -> Vec<PlayBuilder> {
    (0..n).map(|i| PlayBuilder::new(&format!("Artist {i}"), &format!("Track {i}"))).collect()
}

/// A working directory with a `MusicCSV` chunk directory and state next to it
pub struct Workspace {
    pub temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("MusicCSV")).expect("Failed to create chunk dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn chunk_dir(&self) -> PathBuf {
        self.temp_dir.path().join("MusicCSV")
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_dir: self.chunk_dir(),
            state_dir: self.path().to_path_buf(),
            ..Default::default()
        }
    }

    /// Write a chunk file verbatim
    pub fn with_chunk(self, index: u32, content: &str) -> Self {
        fs::write(self.chunk_dir().join(format!("part{index}.csv")), content)
            .expect("Failed to write chunk file");
        self
    }

    /// Write a chunk of `n` numbered songs with a header line
    pub fn with_numbered_chunk(self, index: u32, n: usize) -> Self {
        let mut content = String::from("\"Artist\", \"Track\"\n");
        for i in 0..n {
            content.push_str(&format!("\"Artist {i}\", \"Track {i}\"\n"));
        }
        self.with_chunk(index, &content)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory scrobbler with scripted failures
#[derive(Default)]
pub struct FakeScrobbler {
    pub fail_batches: bool,
    pub fail_titles: HashSet<String>,
    pub batch_calls: Vec<Vec<Scrobble>>,
    pub single_calls: Vec<Scrobble>,
}

impl FakeScrobbler {
    pub fn failing_batches() -> Self {
        Self { fail_batches: true, ..Default::default() }
    }

    pub fn failing_titles(mut self, titles: &[&str]) -> Self {
        self.fail_titles.extend(titles.iter().map(|t| t.to_string()));
        self
    }

    /// Every play the service accepted, in submission order
    pub fn accepted(&self) -> Vec<Scrobble> {
        let mut accepted = Vec::new();
        if !self.fail_batches {
            accepted.extend(self.batch_calls.iter().flatten().cloned());
        }
        accepted.extend(
            self.single_calls.iter().filter(|s| !self.fail_titles.contains(&s.title)).cloned(),
        );
        accepted
    }
}

impl Scrobbler for FakeScrobbler {
    fn scrobble_many(&mut self, scrobbles: &[Scrobble]) -> Result<(), SubmitError> {
        self.batch_calls.push(scrobbles.to_vec());
        if self.fail_batches {
            Err(SubmitError::api(11, "Service Offline"))
        } else {
            Ok(())
        }
    }

    fn scrobble(&mut self, scrobble: &Scrobble) -> Result<(), SubmitError> {
        self.single_calls.push(scrobble.clone());
        if self.fail_titles.contains(&scrobble.title) {
            Err(SubmitError::Network("timed out".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Pacer that records pauses instead of sleeping
#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Vec<Duration>,
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}
