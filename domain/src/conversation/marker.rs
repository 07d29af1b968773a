//! Input-required marker handling
//!
//! The model signals that it needs more information from the user by ending
//! its reply with a marker token. The marker is removed before the reply is
//! stored or shown.

/// Marker used when no other marker is configured
pub const DEFAULT_INPUT_REQUIRED_MARKER: &str = "<INPUT_REQUIRED>";

/// Strip `marker` from the end of `text`.
///
/// Returns the remaining text (trailing whitespace removed) when the reply
/// ends with the marker, `None` otherwise. Only the exact suffix is removed;
/// occurrences of the marker elsewhere in the text are preserved.
pub fn strip_input_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    text.trim_end().strip_suffix(marker).map(str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_marker_at_end() {
        assert_eq!(
            strip_input_marker("Which file? <INPUT_REQUIRED>", DEFAULT_INPUT_REQUIRED_MARKER),
            Some("Which file?")
        );
        assert_eq!(
            strip_input_marker("Which file?\n<INPUT_REQUIRED>\n", DEFAULT_INPUT_REQUIRED_MARKER),
            Some("Which file?")
        );
    }

    #[test]
    fn test_marker_only_removed_as_suffix() {
        assert_eq!(
            strip_input_marker("use <INPUT_REQUIRED> when stuck", DEFAULT_INPUT_REQUIRED_MARKER),
            None
        );
        // Characters of the marker are not trimmed individually
        assert_eq!(
            strip_input_marker("<INPUT_REQUIRED>ED>", DEFAULT_INPUT_REQUIRED_MARKER),
            None
        );
    }

    #[test]
    fn test_marker_only_reply_becomes_empty() {
        assert_eq!(
            strip_input_marker("<INPUT_REQUIRED>", DEFAULT_INPUT_REQUIRED_MARKER),
            Some("")
        );
    }

    #[test]
    fn test_empty_marker_never_matches() {
        assert_eq!(strip_input_marker("anything", ""), None);
    }
}
