use serde::Serialize;
use thiserror::Error;

use crate::models::CanonicalRecord;

/// Errors from the remote scrobbling service
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl SubmitError {
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api { code, message: message.into() }
    }
}

/// One play to be logged remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scrobble {
    pub artist: String,
    pub title: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl Scrobble {
    pub fn new(song: &CanonicalRecord, timestamp: i64) -> Self {
        Self { artist: song.artist.clone(), title: song.track.clone(), timestamp }
    }
}

/// The remote history-logging service
///
/// Both calls may fail transiently; callers must handle every error.
pub trait Scrobbler {
    /// Submit several plays in one call (the service accepts at most 50)
    fn scrobble_many(&mut self, scrobbles: &[Scrobble]) -> Result<(), SubmitError>;

    /// Submit a single play
    fn scrobble(&mut self, scrobble: &Scrobble) -> Result<(), SubmitError>;
}

impl<S: Scrobbler + ?Sized> Scrobbler for &mut S {
    fn scrobble_many(&mut self, scrobbles: &[Scrobble]) -> Result<(), SubmitError> {
        (**self).scrobble_many(scrobbles)
    }

    fn scrobble(&mut self, scrobble: &Scrobble) -> Result<(), SubmitError> {
        (**self).scrobble(scrobble)
    }
}
