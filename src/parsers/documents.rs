use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Deserializer, Map, Value};
use tracing::debug;

/// A single listening-history entry with export-specific keys
pub type HistoryItem = Map<String, Value>;

const UTF8_BOM: char = '\u{feff}';

/// Find where to resume decoding after a failure at `offset`
///
/// Returns the earliest byte offset strictly after `offset` that holds an object or array
/// start, or `None` when the rest of the text has no plausible document start.
pub fn resync_offset(text: &str, offset: usize) -> Option<usize> {
    let start = offset.checked_add(1)?;
    let rest = text.as_bytes().get(start..)?;
    rest.iter().position(|&b| b == b'{' || b == b'[').map(|pos| start + pos)
}

/// Lazily decodes consecutive top-level JSON values from one text blob
///
/// Values may be concatenated with or without whitespace between them. A value that fails
/// to decode is skipped via [`resync_offset`]; trailing text with no further document start
/// is dropped silently.
pub struct JsonValues<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> JsonValues<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn finish(&mut self) -> Option<Value> {
        self.pos = self.text.len();
        None
    }
}

impl Iterator for JsonValues<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let rest = self.text.get(self.pos..)?;
            let trimmed = rest.trim_start();
            if trimmed.is_empty() {
                return self.finish();
            }
            self.pos += rest.len() - trimmed.len();

            let mut stream = Deserializer::from_str(trimmed).into_iter::<Value>();
            match stream.next() {
                Some(Ok(value)) => {
                    self.pos += stream.byte_offset();
                    return Some(value);
                }
                Some(Err(e)) => {
                    debug!(offset = self.pos, error = %e, "skipping malformed JSON document");
                    match resync_offset(self.text, self.pos) {
                        Some(next) => self.pos = next,
                        None => return self.finish(),
                    }
                }
                None => return self.finish(),
            }
        }
    }
}

/// History items from a text blob: arrays are flattened to their object elements, bare
/// objects are yielded as-is, and every other JSON shape is discarded
pub struct HistoryItems<'a> {
    values: JsonValues<'a>,
    pending: std::vec::IntoIter<Value>,
}

impl<'a> HistoryItems<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { values: JsonValues::new(text), pending: Vec::new().into_iter() }
    }
}

impl Iterator for HistoryItems<'_> {
    type Item = HistoryItem;

    fn next(&mut self) -> Option<HistoryItem> {
        loop {
            if let Some(value) = self.pending.next() {
                if let Value::Object(item) = value {
                    return Some(item);
                }
                continue;
            }

            match self.values.next()? {
                Value::Array(elements) => self.pending = elements.into_iter(),
                Value::Object(item) => return Some(item),
                _ => {}
            }
        }
    }
}

/// Read a raw export document
///
/// Invalid UTF-8 sequences are replaced rather than rejected and a leading byte-order mark
/// is dropped, so only I/O failures produce an error.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read export file: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    fn track_names(text: &str) -> Vec<String> {
        HistoryItems::new(text)
            .map(|item| item.get("trackName").and_then(Value::as_str).unwrap_or("?").to_string())
            .collect()
    }

    #[test]
    fn test_resync_finds_next_document_start() {
        let text = r#"{"a": oops} [1] {"b": 2}"#;
        assert_eq!(resync_offset(text, 0), Some(12));
        assert_eq!(resync_offset(text, 12), Some(16));
        assert_eq!(resync_offset(text, 16), None);
    }

    #[test]
    fn test_resync_is_strictly_after_offset() {
        assert_eq!(resync_offset("{{", 0), Some(1));
        assert_eq!(resync_offset("{", 0), None);
        assert_eq!(resync_offset("", 0), None);
        assert_eq!(resync_offset("abc", 10), None);
    }

    #[test]
    fn test_concatenated_values_without_separators() {
        let text = r#"[{"trackName":"A"},{"trackName":"B"}]{"trackName":"C"}[{"trackName":"D"}]"#;
        assert_eq!(track_names(text), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_whitespace_between_values() {
        let text = "\n  {\"trackName\":\"A\"}\n\n\t[{\"trackName\":\"B\"}]\n";
        assert_eq!(track_names(text), vec!["A", "B"]);
    }

    #[test]
    fn test_corrupted_document_between_valid_ones() {
        let text = r#"[{"trackName":"A"}]{"trackName": "broken", oops}[{"trackName":"B"}]"#;
        assert_eq!(track_names(text), vec!["A", "B"]);
    }

    #[test]
    fn test_truncated_trailing_document_is_dropped() {
        let text = r#"[{"trackName":"A"}] {"trackName": "trunc"#;
        assert_eq!(track_names(text), vec!["A"]);
    }

    #[test]
    fn test_leading_garbage_is_skipped() {
        let text = r#"garbage here {"trackName":"A"}"#;
        assert_eq!(track_names(text), vec!["A"]);
    }

    #[test]
    fn test_non_object_shapes_are_discarded() {
        let text = r#"42 "text" [1, "x", {"trackName":"A"}, null] true"#;
        assert_eq!(track_names(text), vec!["A"]);
    }

    #[test]
    fn test_raw_values_are_yielded_in_order() {
        let values: Vec<Value> = JsonValues::new(r#"{"a":1}[2]"#).collect();
        assert_eq!(values, vec![json!({"a": 1}), json!([2])]);
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        assert_eq!(HistoryItems::new("").count(), 0);
        assert_eq!(HistoryItems::new("   \n\t ").count(), 0);
    }

    #[test]
    fn test_read_document_strips_bom_and_replaces_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xef\xbb\xbf[{\"trackName\":\"A\xff\"}]").unwrap();
        file.flush().unwrap();

        let text = read_document(file.path()).unwrap();
        assert!(text.starts_with('['));
        assert_eq!(track_names(&text), vec!["A\u{fffd}"]);
    }

    #[test]
    fn test_read_document_missing_file() {
        let result = read_document(Path::new("/nonexistent/history.json"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read export file"));
    }
}
