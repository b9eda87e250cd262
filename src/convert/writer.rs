use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::quoting::{DEFAULT_HEADER, format_line, single_line};
use crate::models::{CanonicalRecord, DurationPolicy};
use crate::parsers::{HistoryItems, SchemaTable, read_document};

/// Options for a canonical conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub policy: DurationPolicy,
    pub schema: SchemaTable,
    /// Emit a `"Artist", "Track"` header as the first line
    pub header: bool,
}

impl ConvertOptions {
    pub fn new(policy: DurationPolicy) -> Self {
        Self { policy, schema: SchemaTable::default(), header: false }
    }
}

/// Counters for one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Records written to the canonical file
    pub records: usize,
    pub files_read: usize,
    pub files_skipped: usize,
    pub items_seen: usize,
    /// Items without a usable artist or track
    pub not_extractable: usize,
    /// Items rejected by the duration policy
    pub filtered: usize,
}

/// Stream canonical records from the given export files into `out_path`
///
/// Files are processed in the order given (callers pass them sorted). Each accepted record
/// is written as soon as it is found. A file that cannot be read counts as zero records.
///
/// # Errors
///
/// Returns an error only if the output file cannot be created or written.
pub fn write_canonical(
    files: &[PathBuf],
    out_path: &Path,
    options: &ConvertOptions,
) -> Result<ConvertSummary> {
    let file = File::create(out_path)
        .with_context(|| format!("Failed to create output file: {}", out_path.display()))?;
    let mut out = BufWriter::new(file);
    let mut summary = ConvertSummary::default();

    if options.header {
        writeln!(out, "{}", format_line(&DEFAULT_HEADER))
            .context("Failed to write output header")?;
    }

    for path in files {
        let text = match read_document(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable file {}: {:#}", path.display(), e);
                summary.files_skipped += 1;
                continue;
            }
        };
        summary.files_read += 1;

        let before = summary.records;
        for item in HistoryItems::new(&text) {
            summary.items_seen += 1;

            let Some(record) = options.schema.extract_pair(&item) else {
                summary.not_extractable += 1;
                continue;
            };
            if !options.policy.accepts(options.schema.extract_duration_ms(&item)) {
                summary.filtered += 1;
                continue;
            }

            write_record(&mut out, &record)
                .with_context(|| format!("Failed to write to {}", out_path.display()))?;
            summary.records += 1;
        }
        debug!("{}: {} records", path.display(), summary.records - before);
    }

    out.flush().with_context(|| format!("Failed to flush {}", out_path.display()))?;
    Ok(summary)
}

fn write_record<W: Write>(out: &mut W, record: &CanonicalRecord) -> std::io::Result<()> {
    writeln!(out, "{}", format_line(&[single_line(&record.artist), single_line(&record.track)]))
}
