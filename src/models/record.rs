use serde::{Deserialize, Serialize};

/// A normalized (artist, track) pair
///
/// Both fields are guaranteed non-blank when built through [`CanonicalRecord::new`].
/// Serialized as `{"artist": ..., "track": ...}`, which is also the shape of the
/// failed-songs side files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub artist: String,
    pub track: String,
}

impl CanonicalRecord {
    /// Build a record, rejecting blank artist or track values
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Option<Self> {
        let artist = artist.into();
        let track = track.into();
        if artist.trim().is_empty() || track.trim().is_empty() {
            return None;
        }
        Some(Self { artist, track })
    }

    /// True for the `"Artist", "Track"` header row, compared case-insensitively
    pub fn is_header(&self) -> bool {
        self.artist.eq_ignore_ascii_case("artist") && self.track.eq_ignore_ascii_case("track")
    }
}

/// What to do with history items that carry no parseable play duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownDuration {
    /// Drop the item (strict conversion)
    Exclude,
    /// Keep the item regardless of the threshold (permissive conversion)
    Include,
}

/// Minimum-play filter, in milliseconds
///
/// No `Default`: callers pick the threshold and the unknown-duration behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPolicy {
    pub min_ms: u64,
    pub unknown: UnknownDuration,
}

impl DurationPolicy {
    pub fn new(min_ms: u64, unknown: UnknownDuration) -> Self {
        Self { min_ms, unknown }
    }

    /// Decide whether an item with the given duration makes it into the output
    pub fn accepts(&self, duration_ms: Option<i64>) -> bool {
        match duration_ms {
            Some(ms) => u64::try_from(ms).is_ok_and(|ms| ms >= self.min_ms),
            None => self.unknown == UnknownDuration::Include,
        }
    }
}
