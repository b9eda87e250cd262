//! Data models for listening-history conversion and scrobbling.
//!
//! - [`CanonicalRecord`] - Normalized (artist, track) pair, the unit of canonical output
//! - [`DurationPolicy`] - Minimum-play filter applied while converting exports
//! - [`ProblemLine`] - A chunk line that could not be parsed, kept for operator review

pub mod problem;
pub mod record;

pub use problem::ProblemLine;
pub use record::{CanonicalRecord, DurationPolicy, UnknownDuration};
