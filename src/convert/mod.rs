//! Conversion from raw exports to the canonical file and its chunk files
//!
//! # Error Handling Strategy
//!
//! - **Input files**: Unreadable exports are logged as warnings and counted as skipped; the
//!   run continues with the next file.
//! - **Output files**: Failing to create or write the canonical file or a chunk file is fatal
//!   and propagated with context, since a partial output would silently lose records.

pub mod discovery;
pub mod partition;
pub mod quoting;
pub mod writer;

pub use discovery::{collect_input_files, discover_history_files};
pub use partition::{HeaderMode, split_into_chunks};
pub use quoting::{format_line, quote_field};
pub use writer::{ConvertOptions, ConvertSummary, write_canonical};
