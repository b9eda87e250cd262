//! The minimal quoting convention shared by canonical and chunk files
//!
//! Every field is wrapped in `"` with embedded quotes doubled, and fields are joined with
//! `", "`. This is deliberately narrower than RFC 4180.

/// Header written at the top of every chunk file
pub const DEFAULT_HEADER: [&str; 2] = ["Artist", "Track"];

/// Wrap a value in quotes, doubling any embedded quote characters
pub fn quote_field(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Format one line (without terminator) from the given fields
pub fn format_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields.iter().map(|f| quote_field(f.as_ref())).collect::<Vec<_>>().join(", ")
}

/// Replace line breaks so a record always occupies a single line
pub fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("Muse"), r#""Muse""#);
        assert_eq!(quote_field(r#"12" Mix"#), r#""12"" Mix""#);
        assert_eq!(quote_field(""), r#""""#);
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(&DEFAULT_HEADER), r#""Artist", "Track""#);
        assert_eq!(format_line(&["A, B".to_string(), "T".to_string()]), r#""A, B", "T""#);
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("Live\r\nin\nParis\r"), "Live in Paris ");
    }
}
