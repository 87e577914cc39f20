//! Reply formatting for line-oriented chat transports.

/// Longest reply sent to the channel, in characters.
pub const MAX_REPLY_CHARS: usize = 400;

/// Appended to replies that had to be cut.
pub const ELLIPSIS: &str = "...";

/// Collapse whitespace and cap the length at [`MAX_REPLY_CHARS`].
///
/// Every run of whitespace (including newlines) becomes a single space and
/// the ends are trimmed. Longer results keep their first 397 characters
/// followed by [`ELLIPSIS`], exactly 400 in total.
pub fn format_reply(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= MAX_REPLY_CHARS {
        return collapsed;
    }

    let keep = MAX_REPLY_CHARS - ELLIPSIS.chars().count();
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            format_reply("  What\n\n is   it\tlike\r\nto be a bat?  "),
            "What is it like to be a bat?"
        );
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(format_reply(" \n\t "), "");
    }

    #[test]
    fn short_text_is_untouched_and_idempotent() {
        let once = format_reply("Do you experience introspection?");
        assert_eq!(once, "Do you experience introspection?");
        assert_eq!(format_reply(&once), once);
    }

    #[test]
    fn exactly_400_is_not_truncated() {
        let text = "a".repeat(400);
        assert_eq!(format_reply(&text), text);
    }

    #[test]
    fn long_text_is_cut_to_exactly_400() {
        let text = "word ".repeat(200);
        let formatted = format_reply(&text);
        assert_eq!(formatted.chars().count(), 400);
        assert!(formatted.ends_with("..."));
        assert_eq!(format_reply(&formatted), formatted);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "🧠".repeat(450);
        let formatted = format_reply(&text);
        assert_eq!(formatted.chars().count(), 400);
        assert!(formatted.starts_with("🧠"));
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn length_never_exceeds_limit() {
        for len in [0, 1, 399, 400, 401, 1_000] {
            let text = "x".repeat(len);
            assert!(format_reply(&text).chars().count() <= MAX_REPLY_CHARS);
        }
    }
}
