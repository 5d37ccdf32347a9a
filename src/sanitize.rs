//! Text normalization for raw page text coming out of the PDF parser.
//!
//! Steps, in order: Unicode NFC, then control characters (C0, DEL, C1) replaced
//! by a space, then runs of two or more whitespace characters collapsed into one.

use unicode_normalization::UnicodeNormalization;

/// Normalize raw page text. Idempotent.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_ws: Option<char> = None;
    let mut run = 0usize;

    for c in text.nfc() {
        let c = if c.is_control() { ' ' } else { c };

        if c.is_whitespace() {
            run += 1;
            pending_ws = Some(c);
            continue;
        }

        flush_whitespace(&mut out, pending_ws.take(), run);
        run = 0;
        out.push(c);
    }
    flush_whitespace(&mut out, pending_ws, run);

    out
}

// A lone whitespace char is kept as is; a run becomes a single space.
fn flush_whitespace(out: &mut String, last: Option<char>, run: usize) {
    match (last, run) {
        (Some(c), 1) => out.push(c),
        (Some(_), _) => out.push(' '),
        (None, _) => {}
    }
}

/// Returns the first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_chars_become_spaces() {
        assert_eq!(sanitize("a\u{0001}b"), "a b");
        assert_eq!(sanitize("a\u{007F}b"), "a b");
        assert_eq!(sanitize("a\u{0085}b"), "a b");
        assert_eq!(sanitize("a\u{009F}b"), "a b");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(sanitize("binary    search\n\n\ttree"), "binary search tree");
        assert_eq!(sanitize("a\r\nb"), "a b");
    }

    #[test]
    fn test_single_whitespace_kept() {
        assert_eq!(sanitize("a b"), "a b");
        assert_eq!(sanitize("a\u{00A0}b"), "a\u{00A0}b");
    }

    #[test]
    fn test_newline_alone_becomes_space() {
        // '\n' is a control character, so it is replaced before collapsing.
        assert_eq!(sanitize("hash\nmap"), "hash map");
    }

    #[test]
    fn test_nfc_normalization() {
        let decomposed = "cafe\u{0301}";
        assert_eq!(sanitize(decomposed), "caf\u{00E9}");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "plain text",
            "\u{0000}\u{0001}  \t\n mixed \u{0085}\u{00A0}\u{00A0} runs",
            "  leading and trailing  ",
            "e\u{0301}\u{0007}\u{0301}",
            "\u{2003}\u{2003}x\u{2003}",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_no_whitespace_run_longer_than_one() {
        let out = sanitize("a \t\n\u{000B}\u{000C}\r b\u{00A0} c\u{2003}\u{2003}d");
        let mut prev_ws = false;
        for c in out.chars() {
            let ws = c.is_whitespace();
            assert!(!(ws && prev_ws), "whitespace run in {:?}", out);
            prev_ws = ws;
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 0), "");
    }
}
