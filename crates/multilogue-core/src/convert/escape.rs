//! Escaping between plain-text whitespace semantics and dialogue markup.
//!
//! The escaped alphabet is fixed: the five HTML-special characters plus the
//! two whitespace characters the transcript format gives meaning to. A tab
//! marks a paragraph-internal break and renders as an em space; a newline is
//! a soft break and renders as an explicit break element. The two must never
//! collapse into each other across a round-trip.

use std::sync::OnceLock;

use regex::Regex;

/// Escapes utterance text for embedding in dialogue markup.
///
/// Ampersands are substituted first so the entities introduced by the later
/// replacements are not themselves escaped.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
        .replace('\t', "&emsp;")
        .replace('\n', "<br />")
}

/// Recovers literal text from a markup fragment.
///
/// A break element followed by an em space decodes to the paragraph-internal
/// break marker (newline + tab); a lone break element decodes to a newline.
/// Remaining tags are dropped with their inner text kept, then entities are
/// decoded.
pub fn unescape_markup(markup: &str) -> String {
    let text = break_emsp_re().replace_all(markup, "\n\t");
    let text = break_re().replace_all(&text, "\n");
    let text = strip_tags(&text);
    html_escape::decode_html_entities(&text).into_owned()
}

fn break_emsp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>\s*(?:&emsp;|\x{2003})").expect("valid break+emsp pattern")
    })
}

fn break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid break pattern"))
}

/// Removes every HTML-like tag, keeping the text between tags.
pub(crate) fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // Unterminated tag: keep the trailing text as-is.
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(
            escape_markup(r#"a & b < c > d "e" 'f'"#),
            "a &amp; b &lt; c &gt; d &quot;e&quot; &#039;f&#039;"
        );
    }

    #[test]
    fn test_escape_ampersand_first() {
        // A literal "&lt;" in the source must not end up double-decoded.
        assert_eq!(escape_markup("&lt;"), "&amp;lt;");
        assert_eq!(unescape_markup(&escape_markup("&lt;")), "&lt;");
    }

    #[test]
    fn test_escape_whitespace_semantics() {
        assert_eq!(escape_markup("one\ntwo"), "one<br />two");
        assert_eq!(escape_markup("one\n\ttwo"), "one<br />&emsp;two");
    }

    #[test]
    fn test_unescape_break_variants() {
        assert_eq!(unescape_markup("one<br>two"), "one\ntwo");
        assert_eq!(unescape_markup("one<br/>two"), "one\ntwo");
        assert_eq!(unescape_markup("one<BR />two"), "one\ntwo");
    }

    #[test]
    fn test_unescape_break_with_emsp() {
        assert_eq!(unescape_markup("one<br />&emsp;two"), "one\n\ttwo");
        assert_eq!(unescape_markup("one<br> &emsp;two"), "one\n\ttwo");
        assert_eq!(unescape_markup("one<br />\u{2003}two"), "one\n\ttwo");
    }

    #[test]
    fn test_soft_break_and_paragraph_break_stay_distinct() {
        let text = "first\nsecond\n\tthird";
        assert_eq!(unescape_markup(&escape_markup(text)), text);
    }

    #[test]
    fn test_unescape_strips_unknown_tags() {
        assert_eq!(unescape_markup("a <em>b</em> c"), "a b c");
    }

    #[test]
    fn test_unescape_decodes_entities() {
        assert_eq!(unescape_markup("2 &lt; 3 &amp;&amp; 4 &gt; 1"), "2 < 3 && 4 > 1");
        assert_eq!(unescape_markup("&quot;hi&quot; &#039;there&#039;"), "\"hi\" 'there'");
    }

    #[test]
    fn test_round_trip() {
        let text = "he said \"wait\" & left <quickly>\nthen 'returned'";
        assert_eq!(unescape_markup(&escape_markup(text)), text);
    }
}
