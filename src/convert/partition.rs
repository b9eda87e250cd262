use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::quoting::{DEFAULT_HEADER, format_line};
use crate::parsers::split_quoted_fields;
use crate::submit::chunks::{chunk_file_name, parse_chunk_index};

/// How the first line of the canonical file is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first line is a header and is repeated at the top of every chunk
    FirstLine,
    /// Every line is data; chunks get the default `"Artist", "Track"` header
    None,
}

/// Split a canonical file into `part{i}.csv` chunk files of at most `lines_per_file` records
///
/// Every non-blank line counts as one record, so chunk boundaries depend only on the number
/// of records and `lines_per_file`. Lines that parse with the quoting grammar are re-emitted
/// in canonical form; anything else is copied through unchanged. Output is identical across
/// re-runs on the same input.
///
/// Chunk files already in `out_dir` are removed first, so the directory only ever holds the
/// chunks of the latest split.
///
/// Returns the number of chunk files created. A `lines_per_file` of zero creates nothing.
pub fn split_into_chunks(
    input: &Path,
    out_dir: &Path,
    lines_per_file: usize,
    mode: HeaderMode,
) -> Result<usize> {
    if lines_per_file == 0 {
        return Ok(0);
    }

    let file = File::open(input)
        .with_context(|| format!("Failed to open canonical file: {}", input.display()))?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create chunk directory: {}", out_dir.display()))?;
    remove_existing_chunks(out_dir)?;

    let mut lines = BufReader::new(file).lines();
    let header = match mode {
        HeaderMode::FirstLine => match lines.next() {
            Some(line) => canonical_line(&line.context("Failed to read canonical header")?),
            None => return Ok(0),
        },
        HeaderMode::None => format_line(&DEFAULT_HEADER),
    };

    let mut chunks = 0;
    let mut rows_in_chunk = 0;
    let mut current: Option<BufWriter<File>> = None;

    for line in lines {
        let line = line.context("Failed to read line from canonical file")?;
        if line.trim().is_empty() {
            continue;
        }

        if current.is_none() || rows_in_chunk == lines_per_file {
            if let Some(mut finished) = current.take() {
                finished.flush().context("Failed to flush chunk file")?;
                info!("Created {} with {} rows", chunk_file_name(chunks - 1), rows_in_chunk);
            }
            let path = out_dir.join(chunk_file_name(chunks));
            let chunk = File::create(&path)
                .with_context(|| format!("Failed to create chunk file: {}", path.display()))?;
            let mut writer = BufWriter::new(chunk);
            writeln!(writer, "{}", header).context("Failed to write chunk header")?;
            current = Some(writer);
            chunks += 1;
            rows_in_chunk = 0;
        }

        if let Some(writer) = current.as_mut() {
            writeln!(writer, "{}", canonical_line(&line)).context("Failed to write chunk row")?;
            rows_in_chunk += 1;
        }
    }

    if let Some(mut finished) = current.take() {
        finished.flush().context("Failed to flush chunk file")?;
        info!("Created {} with {} rows", chunk_file_name(chunks - 1), rows_in_chunk);
    }

    Ok(chunks as usize)
}

fn remove_existing_chunks(out_dir: &Path) -> Result<()> {
    let entries = fs::read_dir(out_dir)
        .with_context(|| format!("Failed to read chunk directory: {}", out_dir.display()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || parse_chunk_index(&entry.file_name().to_string_lossy()).is_none() {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove old chunk file: {}", path.display()))?;
        debug!("Removed old chunk file {}", path.display());
    }
    Ok(())
}

fn canonical_line(line: &str) -> String {
    let line = line.trim_end_matches('\r');
    match split_quoted_fields(line) {
        Ok(fields) => format_line(&fields),
        Err(_) => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use tempfile::TempDir;

    use super::*;

    fn canonical_file(dir: &TempDir, records: usize, header: bool) -> std::path::PathBuf {
        let mut content = String::new();
        if header {
            content.push_str("\"Artist\", \"Track\"\n");
        }
        for i in 0..records {
            writeln!(content, "\"Artist {}\", \"Track {}\"", i, i).unwrap();
        }
        let path = dir.path().join("output.csv");
        fs::write(&path, content).unwrap();
        path
    }

    fn data_rows(path: &Path) -> usize {
        fs::read_to_string(path).unwrap().lines().count() - 1
    }

    #[test]
    fn test_exact_multiple_of_chunk_size() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 7500, false);
        let out = dir.path().join("chunks");

        assert_eq!(split_into_chunks(&input, &out, 2500, HeaderMode::None).unwrap(), 3);
        for i in 0..3 {
            assert_eq!(data_rows(&out.join(chunk_file_name(i))), 2500);
        }
        assert!(!out.join(chunk_file_name(3)).exists());
    }

    #[test]
    fn test_last_chunk_holds_remainder() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 7500, false);
        let out = dir.path().join("chunks");

        assert_eq!(split_into_chunks(&input, &out, 2600, HeaderMode::None).unwrap(), 3);
        assert_eq!(data_rows(&out.join("part0.csv")), 2600);
        assert_eq!(data_rows(&out.join("part1.csv")), 2600);
        assert_eq!(data_rows(&out.join("part2.csv")), 2300);
    }

    #[test]
    fn test_chunk_contents_and_header() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 3, true);
        let out = dir.path().join("chunks");

        assert_eq!(split_into_chunks(&input, &out, 2, HeaderMode::FirstLine).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(out.join("part0.csv")).unwrap(),
            "\"Artist\", \"Track\"\n\"Artist 0\", \"Track 0\"\n\"Artist 1\", \"Track 1\"\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("part1.csv")).unwrap(),
            "\"Artist\", \"Track\"\n\"Artist 2\", \"Track 2\"\n"
        );
    }

    #[test]
    fn test_header_mode_none_keeps_first_record() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 3, false);
        let out = dir.path().join("chunks");

        split_into_chunks(&input, &out, 10, HeaderMode::None).unwrap();
        let content = fs::read_to_string(out.join("part0.csv")).unwrap();
        assert!(content.starts_with("\"Artist\", \"Track\"\n\"Artist 0\", \"Track 0\"\n"));
        assert_eq!(data_rows(&out.join("part0.csv")), 3);
    }

    #[test]
    fn test_repartition_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("output.csv");
        fs::write(&input, "\"A\",\"One\"\nB, Two\n\"Say \"\"Hi\"\"\", \"X\"\n\"broken\n").unwrap();
        let out = dir.path().join("chunks");

        split_into_chunks(&input, &out, 3, HeaderMode::None).unwrap();
        let first: Vec<String> = (0..2)
            .map(|i| fs::read_to_string(out.join(chunk_file_name(i))).unwrap())
            .collect();

        split_into_chunks(&input, &out, 3, HeaderMode::None).unwrap();
        let second: Vec<String> = (0..2)
            .map(|i| fs::read_to_string(out.join(chunk_file_name(i))).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(
            first[0],
            "\"Artist\", \"Track\"\n\"A\", \"One\"\n\"B\", \"Two\"\n\"Say \"\"Hi\"\"\", \"X\"\n"
        );
        assert_eq!(first[1], "\"Artist\", \"Track\"\n\"broken\n");
    }

    #[test]
    fn test_resplit_removes_chunks_from_previous_split() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 10, false);
        let out = dir.path().join("chunks");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("notes.txt"), "keep me").unwrap();

        assert_eq!(split_into_chunks(&input, &out, 2, HeaderMode::None).unwrap(), 5);
        assert_eq!(split_into_chunks(&input, &out, 5, HeaderMode::None).unwrap(), 2);

        let listed = crate::submit::list_chunk_indices(&out).unwrap();
        assert_eq!(listed, vec![0, 1]);
        let rows: usize = listed.iter().map(|&i| data_rows(&out.join(chunk_file_name(i)))).sum();
        assert_eq!(rows, 10);
        assert!(out.join("notes.txt").exists());
    }

    #[test]
    fn test_zero_lines_per_file_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 5, false);
        let out = dir.path().join("chunks");
        assert_eq!(split_into_chunks(&input, &out, 0, HeaderMode::None).unwrap(), 0);
        assert!(!out.exists());
    }

    #[test]
    fn test_empty_input_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let input = canonical_file(&dir, 0, false);
        let out = dir.path().join("chunks");
        assert_eq!(split_into_chunks(&input, &out, 10, HeaderMode::FirstLine).unwrap(), 0);
        assert_eq!(split_into_chunks(&input, &out, 10, HeaderMode::None).unwrap(), 0);
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let result =
            split_into_chunks(&dir.path().join("nope.csv"), dir.path(), 10, HeaderMode::None);
        assert!(result.is_err());
    }
}
