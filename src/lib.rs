//! Scrobble History - replay listening-history exports as Last.fm scrobbles
//!
//! This library converts personal listening-history exports into a canonical
//! `"Artist", "Track"` file and replays it against Last.fm in resumable chunks. It supports:
//!
//! - Extracting records from concatenated or partly corrupted JSON export files
//! - Normalizing the differing export schemas to one (artist, track) pair
//! - Filtering plays by a minimum duration and splitting the result into chunk files
//! - Batch submission with per-song fallback and crash-resumable progress
//!
//! # Example
//!
//! ```no_run
//! use scrobble_history::{ConvertOptions, DurationPolicy, UnknownDuration, write_canonical};
//! use std::path::{Path, PathBuf};
//!
//! let files = vec![PathBuf::from("StreamingHistory0.json")];
//! let options = ConvertOptions::new(DurationPolicy::new(30_000, UnknownDuration::Exclude));
//! let summary = write_canonical(&files, Path::new("output.csv"), &options)?;
//! println!("Wrote {} records", summary.records);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod convert;
pub mod models;
pub mod parsers;
pub mod progress;
pub mod submit;
pub mod utils;

// Re-export commonly used types
pub use convert::{ConvertOptions, ConvertSummary, HeaderMode, split_into_chunks, write_canonical};
pub use models::{CanonicalRecord, DurationPolicy, ProblemLine, UnknownDuration};
pub use parsers::{HistoryItems, SchemaTable, read_chunk_file};
pub use progress::{ProgressState, ProgressStore};
pub use submit::{PipelineConfig, Scrobble, Scrobbler, SubmitError, Submitter};
