use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{CanonicalRecord, ProblemLine};

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// Outcome of parsing one chunk line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineParse {
    Record(CanonicalRecord),
    /// The `"Artist", "Track"` header row
    Header,
    Blank,
    Problem(String),
}

/// Songs recovered from a chunk file plus the lines that could not be used
#[derive(Debug, Clone, Default)]
pub struct ChunkContents {
    pub songs: Vec<CanonicalRecord>,
    pub problems: Vec<ProblemLine>,
}

/// Split a line with the minimal quoting grammar
///
/// Fields are separated by `,` and leading spaces before a field are skipped. A field that
/// opens with `"` runs to the next unpaired `"`, with `""` standing for a literal quote;
/// any text between the closing quote and the next delimiter is kept. An unterminated
/// quoted field is an error.
pub fn split_quoted_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }

        let mut field = String::new();
        if chars.peek() == Some(&QUOTE) {
            chars.next();
            loop {
                match chars.next() {
                    Some(QUOTE) if chars.peek() == Some(&QUOTE) => {
                        chars.next();
                        field.push(QUOTE);
                    }
                    Some(QUOTE) => break,
                    Some(c) => field.push(c),
                    None => return Err("unterminated quoted field".to_string()),
                }
            }
        }

        let mut hit_delimiter = false;
        for c in chars.by_ref() {
            if c == DELIMITER {
                hit_delimiter = true;
                break;
            }
            field.push(c);
        }
        fields.push(field);

        if !hit_delimiter {
            return Ok(fields);
        }
    }
}

/// Manual fallback split for lines the quoting grammar cannot handle
///
/// Recognises `"artist", "track"`, `"artist","track"`, fully quoted lines, and a plain
/// split on the first comma. Surrounding whitespace and quotes are trimmed from both sides.
pub fn manual_split(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let parts: Vec<&str> = if line.contains("\", \"") {
        line.split("\", \"").collect()
    } else if line.contains("\",\"") {
        line.split("\",\"").collect()
    } else if line.contains(DELIMITER) {
        let inner = if line.len() >= 2 && line.starts_with(QUOTE) && line.ends_with(QUOTE) {
            &line[1..line.len() - 1]
        } else {
            line
        };
        if inner.contains("\", \"") {
            inner.splitn(2, "\", \"").collect()
        } else if inner.contains("\",\"") {
            inner.splitn(2, "\",\"").collect()
        } else {
            inner.splitn(2, DELIMITER).collect()
        }
    } else {
        return None;
    };

    match parts.as_slice() {
        [artist, track] => Some((clean_manual(artist), clean_manual(track))),
        _ => None,
    }
}

fn clean_manual(part: &str) -> String {
    part.trim().trim_matches(QUOTE).trim().to_string()
}

/// Parse one chunk line, strict grammar first and manual split second
pub fn parse_chunk_line(line: &str) -> LineParse {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return LineParse::Blank;
    }

    let (artist, track) = match split_quoted_fields(line) {
        Ok(fields) if fields.len() >= 2 => {
            (fields[0].trim().to_string(), fields[1].trim().to_string())
        }
        Ok(fields) if fields.len() == 1 && fields[0].contains(DELIMITER) => {
            match manual_split(&fields[0]) {
                Some(pair) => pair,
                None => return LineParse::Problem("could not split single field".to_string()),
            }
        }
        Ok(_) => match manual_split(line) {
            Some(pair) => pair,
            None => return LineParse::Problem("expected artist and track fields".to_string()),
        },
        Err(strict_err) => match manual_split(line) {
            Some(pair) => pair,
            None => return LineParse::Problem(strict_err),
        },
    };

    match CanonicalRecord::new(artist, track) {
        Some(record) if record.is_header() => LineParse::Header,
        Some(record) => LineParse::Record(record),
        None => LineParse::Problem("empty artist or track".to_string()),
    }
}

/// Read every usable song from a chunk file
///
/// Undecodable bytes are replaced rather than rejected. Only failing to read the file at all
/// is an error; bad lines end up in [`ChunkContents::problems`].
pub fn read_chunk_file(path: &Path) -> Result<ChunkContents> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read chunk file: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let mut contents = ChunkContents::default();
    for (line_num, line) in text.lines().enumerate() {
        match parse_chunk_line(line) {
            LineParse::Record(song) => contents.songs.push(song),
            LineParse::Header | LineParse::Blank => {}
            LineParse::Problem(error) => {
                contents.problems.push(ProblemLine::new(line_num + 1, line, error));
            }
        }
    }

    Ok(contents)
}
