//! Sanitizing song names for terminal output
//!
//! Artist and track names come straight from export files. They are printed in previews,
//! inspection listings, and failure reports, so escape sequences and control characters are
//! removed before display. Files on disk keep the original text.

use crate::models::CanonicalRecord;

/// Remove ANSI CSI sequences and control characters, folding line breaks and tabs to spaces
///
/// ```
/// use scrobble_history::utils::terminal::sanitize_for_terminal;
///
/// assert_eq!(sanitize_for_terminal("\x1b[31mRed\x1b[0m\nLight"), "Red Light");
/// ```
pub fn sanitize_for_terminal(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // CSI: ESC [ params final-letter
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }

        match ch {
            '\n' | '\r' | '\t' => result.push(' '),
            c if c.is_control() => {}
            c => result.push(c),
        }
    }

    result
}

/// `Artist - Track`, sanitized
pub fn song_label(song: &CanonicalRecord) -> String {
    format!("{} - {}", sanitize_for_terminal(&song.artist), sanitize_for_terminal(&song.track))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_color_and_cursor_sequences() {
        assert_eq!(sanitize_for_terminal("\x1b[2J\x1b[HCleared"), "Cleared");
        assert_eq!(sanitize_for_terminal("\x1b[1m\x1b[31mBold\x1b[0m Red"), "Bold Red");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(sanitize_for_terminal("Alert!\x07\x08"), "Alert!");
        assert_eq!(sanitize_for_terminal("lone\x1bescape"), "loneescape");
    }

    #[test]
    fn test_line_breaks_become_spaces() {
        assert_eq!(sanitize_for_terminal("Line 1\r\nLine 2\tTabbed"), "Line 1  Line 2 Tabbed");
    }

    #[test]
    fn test_unicode_is_preserved() {
        assert_eq!(sanitize_for_terminal("Sigur Rós 🌍"), "Sigur Rós 🌍");
    }

    #[test]
    fn test_song_label() {
        let song = CanonicalRecord::new("Björk", "Army of Me\x1b[0m").unwrap();
        assert_eq!(song_label(&song), "Björk - Army of Me");
    }
}
