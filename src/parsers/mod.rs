//! Tolerant parsers for listening-history exports and chunk files
//!
//! # Error Handling Strategy
//!
//! This module follows a **graceful degradation** approach suitable for CLI tools:
//!
//! - **Malformed documents**: A JSON value that fails to decode is skipped by jumping to the
//!   next `{` or `[` after the failure point ([`documents::resync_offset`]). Only the corrupted
//!   span is lost; decode errors are logged at debug level and never surfaced.
//!
//! - **Unreadable files**: Callers treat a file that cannot be read as holding zero records
//!   and continue with the next file.
//!
//! - **Chunk lines**: Each line is tried with the strict quoting grammar, then with a manual
//!   split. Lines rejected by both are returned as [`crate::models::ProblemLine`]s for the
//!   caller to persist; they never abort a chunk.

pub mod chunk_lines;
pub mod deserializers;
pub mod documents;
pub mod fields;

pub use chunk_lines::{
    ChunkContents, LineParse, manual_split, parse_chunk_line, read_chunk_file, split_quoted_fields,
};
pub use documents::{HistoryItem, HistoryItems, JsonValues, read_document, resync_offset};
pub use fields::SchemaTable;
