//! Resumable submission of chunk files to a scrobbling service
//!
//! # Error Handling Strategy
//!
//! - **Remote failures**: Every [`remote::SubmitError`] is caught. A failed batch call falls
//!   back to one call per song; songs that still fail are written to a side file and the
//!   chunk continues.
//! - **Chunk problems**: A missing or empty chunk file, or a declined confirmation, ends the
//!   chunk without touching progress.
//! - **Local I/O**: Failing to write progress or side files is propagated with context.

pub mod chunks;
pub mod config;
pub mod lastfm;
pub mod pipeline;
pub mod remote;
pub mod timing;

pub use chunks::{chunk_file_name, list_chunk_indices, parse_chunk_index};
pub use config::PipelineConfig;
pub use lastfm::LastFmClient;
pub use pipeline::{
    BatchOutcome, ChunkOutcome, ChunkPreview, ChunkReport, ChunkState, LoadedChunk,
    SubmissionSummary, Submitter, batch_timestamps, inspect_chunk, load_chunk,
};
pub use remote::{Scrobble, Scrobbler, SubmitError};
pub use timing::{Clock, Pacer, SystemClock, ThreadPacer};
