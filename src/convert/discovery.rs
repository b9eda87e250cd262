use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use walkdir::WalkDir;

/// Filename prefixes used by the known listening-history export formats
const HISTORY_PREFIXES: &[&str] = &["StreamingHistory", "Streaming_History_", "endsong_"];

/// Resolve the export files to convert
///
/// Explicit inputs may be files or directories; directories are walked recursively for
/// `*.json`. Inputs that do not exist are logged and skipped. The result is sorted and free
/// of duplicates so conversion order is deterministic.
pub fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(false) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && is_json(entry.path()) => {
                        files.insert(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable entry under {}: {}", input.display(), e),
                }
            }
        } else if input.is_file() {
            files.insert(input.clone());
        } else {
            warn!("Input not found: {}", input.display());
        }
    }

    files.into_iter().collect()
}

/// Find history exports directly inside `dir`
///
/// Prefers files named like known export formats (or containing `History`); when none
/// match, every `*.json` file in the directory is used.
pub fn discover_history_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut named = BTreeSet::new();
    let mut any_json = BTreeSet::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_json(&path) {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if looks_like_history(&name) {
            named.insert(path.clone());
        }
        any_json.insert(path);
    }

    let chosen = if named.is_empty() { any_json } else { named };
    Ok(chosen.into_iter().collect())
}

fn looks_like_history(name: &str) -> bool {
    HISTORY_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) || name.contains("History")
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
