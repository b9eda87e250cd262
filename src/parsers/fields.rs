use serde_json::Value;

use super::documents::HistoryItem;
use crate::models::CanonicalRecord;

/// Ordered key candidates for each canonical field
///
/// Several export formats name the same field differently; the first candidate holding a
/// usable value wins. [`SchemaTable::default`] covers the Spotify formats (extended
/// `endsong`/`Streaming_History_Audio`, account-data `StreamingHistory`) plus generic
/// fallbacks.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    pub artist_keys: Vec<&'static str>,
    pub track_keys: Vec<&'static str>,
    pub duration_keys: Vec<&'static str>,
}

impl Default for SchemaTable {
    fn default() -> Self {
        Self {
            artist_keys: vec![
                "master_metadata_album_artist_name", // extended streaming history
                "artistName",                        // account data
                "artist",
            ],
            track_keys: vec!["master_metadata_track_name", "trackName", "track", "song"],
            duration_keys: vec![
                "ms_played",
                "msPlayed",
                "playback_duration_ms",
                "playbackDurationMs",
                "duration_ms",
            ],
        }
    }
}

impl SchemaTable {
    /// Extract the (artist, track) pair, or `None` when either side is not extractable
    pub fn extract_pair(&self, item: &HistoryItem) -> Option<CanonicalRecord> {
        let artist = first_present(item, &self.artist_keys).and_then(scalar_text)?;
        let track = first_present(item, &self.track_keys).and_then(scalar_text)?;
        CanonicalRecord::new(artist, track)
    }

    /// Extract the play duration in milliseconds
    ///
    /// Candidates are tried in order and the first one that parses as an integer wins; a
    /// present but non-numeric value falls through to the next key.
    pub fn extract_duration_ms(&self, item: &HistoryItem) -> Option<i64> {
        self.duration_keys.iter().filter_map(|key| item.get(*key)).find_map(integer_value)
    }
}

/// First candidate whose value is not null, an empty string, or an empty array
fn first_present<'a>(item: &'a HistoryItem, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| item.get(*key)).find(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
