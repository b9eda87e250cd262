use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

const CHUNK_PREFIX: &str = "part";
const CHUNK_EXTENSION: &str = ".csv";

/// File name of the chunk with the given index, e.g. `part3.csv`
pub fn chunk_file_name(index: u32) -> String {
    format!("{CHUNK_PREFIX}{index}{CHUNK_EXTENSION}")
}

/// Parse the index out of a chunk file name; `None` for anything else
pub fn parse_chunk_index(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix(CHUNK_PREFIX)?.strip_suffix(CHUNK_EXTENSION)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Indices of all chunk files in `dir`, ascending
///
/// # Errors
///
/// Fails if `dir` does not exist or cannot be read.
pub fn list_chunk_indices(dir: &Path) -> Result<Vec<u32>> {
    if !dir.is_dir() {
        bail!("Chunk directory not found: {}", dir.display());
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read chunk directory: {}", dir.display()))?;

    let mut indices: Vec<u32> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| parse_chunk_index(&entry.file_name().to_string_lossy()))
        .collect();
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}
