//! Dialogue transcript parsers.
//!
//! Both parsers produce an ordered sequence of turns and never fail: units
//! without a recognizable speaker are skipped with a warning, and an empty
//! result from non-empty input is a valid outcome the caller may interpret.

use tracing::warn;

use super::escape::unescape_markup;

/// One speaker utterance unit, the atomic element of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: String,
    pub utterance: String,
}

/// Parses a markup transcript into turns.
///
/// Each `<p class="dialogue">` container yields one turn: the speaker is the
/// text of its `<span class="speaker">` label, the utterance is the markup
/// after the label (single leading space stripped), unescaped and trimmed.
/// Paragraphs without a speaker label are skipped.
pub fn parse_markup(markup: &str) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut rest = markup;

    while let Some(paragraph) = next_element(rest, "p") {
        rest = paragraph.tail;
        if !class_list_contains(paragraph.attrs, "dialogue") {
            continue;
        }
        match split_speaker_label(paragraph.inner) {
            Some(turn) => turns.push(turn),
            None => warn!("skipping dialogue paragraph without a speaker label"),
        }
    }

    turns
}

/// Parses a plain-text transcript into turns.
///
/// Blocks are separated by a blank line only when the blank line is
/// immediately followed by a `speaker:` prefix, so an utterance may itself
/// contain blank lines without being fragmented. Within a block, runs of two
/// or more newlines collapse to the paragraph-internal break marker.
pub fn parse_text(text: &str) -> Vec<Turn> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut turns = Vec::new();
    for block in split_blocks(trimmed) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        match split_speaker_line(block) {
            Some((speaker, rest)) => turns.push(Turn {
                speaker: speaker.to_string(),
                utterance: collapse_paragraph_breaks(rest),
            }),
            None => warn!("skipping transcript block without a speaker prefix"),
        }
    }

    turns
}

/// Collapses runs of two or more newlines into the paragraph-internal break
/// marker (newline + tab) and trims the result.
pub(crate) fn collapse_paragraph_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0usize;
    for c in text.chars() {
        if c == '\n' {
            newline_run += 1;
            continue;
        }
        match newline_run {
            0 => {}
            1 => out.push('\n'),
            _ => out.push_str("\n\t"),
        }
        newline_run = 0;
        out.push(c);
    }
    out.trim().to_string()
}

/// A scanned `<name ...>inner</name>` element.
struct RawElement<'a> {
    attrs: &'a str,
    inner: &'a str,
    tail: &'a str,
}

/// Scans for the next complete element with the given tag name.
///
/// Tag names match case-insensitively. Elements whose close tag never
/// appears are treated as the end of parsable input.
fn next_element<'a>(input: &'a str, name: &str) -> Option<RawElement<'a>> {
    let open_prefix = format!("<{name}");
    let close_tag = format!("</{name}>");
    let mut from = 0;

    loop {
        let start = find_ci(input, &open_prefix, from)?;
        let after_name = start + open_prefix.len();
        // "<p>" or "<p ...>", not a longer tag name like "<pre>".
        let is_boundary = match input[after_name..].chars().next() {
            Some('>') => true,
            Some(c) => c.is_ascii_whitespace(),
            None => false,
        };
        if !is_boundary {
            from = after_name;
            continue;
        }
        let open_end = input[after_name..].find('>').map(|i| after_name + i)?;
        let close = find_ci(input, &close_tag, open_end + 1)?;
        return Some(RawElement {
            attrs: &input[after_name..open_end],
            inner: &input[open_end + 1..close],
            tail: &input[close + close_tag.len()..],
        });
    }
}

/// ASCII case-insensitive substring search starting at `from`.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || from + n.len() > h.len() {
        return None;
    }
    (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Returns true when the tag attributes carry `wanted` in their class list.
fn class_list_contains(attrs: &str, wanted: &str) -> bool {
    let Some(pos) = find_ci(attrs, "class", 0) else {
        return false;
    };
    let rest = attrs[pos + "class".len()..].trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return false;
    };
    let rest = rest.trim_start();
    let value = if let Some(quoted) = rest.strip_prefix('"') {
        quoted.split('"').next().unwrap_or_default()
    } else if let Some(quoted) = rest.strip_prefix('\'') {
        quoted.split('\'').next().unwrap_or_default()
    } else {
        rest.split_ascii_whitespace().next().unwrap_or_default()
    };
    value
        .split_ascii_whitespace()
        .any(|class| class.eq_ignore_ascii_case(wanted))
}

/// Splits a dialogue paragraph's inner markup into speaker and utterance.
fn split_speaker_label(inner: &str) -> Option<Turn> {
    let label = find_speaker_span(inner)?;
    let speaker = unescape_markup(label.inner).trim().to_string();

    let utterance_markup = label.tail.strip_prefix(' ').unwrap_or(label.tail);
    let utterance = unescape_markup(utterance_markup).trim().to_string();

    Some(Turn { speaker, utterance })
}

/// Finds the first `<span class="speaker">` label in a paragraph.
fn find_speaker_span(inner: &str) -> Option<RawElement<'_>> {
    let mut rest = inner;
    loop {
        let span = next_element(rest, "span")?;
        if class_list_contains(span.attrs, "speaker") {
            return Some(span);
        }
        rest = span.tail;
    }
}

/// Splits plain text into blocks at blank lines followed by a speaker prefix.
fn split_blocks(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut block_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'\n' && bytes[i + 1] == b'\n' && starts_with_speaker(&text[i + 2..]) {
            blocks.push(&text[block_start..i]);
            block_start = i + 2;
            i += 2;
        } else {
            i += 1;
        }
    }

    blocks.push(&text[block_start..]);
    blocks
}

/// Matches the `speaker:` prefix of a block, returning speaker and remainder.
fn split_speaker_line(block: &str) -> Option<(&str, &str)> {
    let ident_len = block
        .bytes()
        .take_while(|&b| is_speaker_byte(b))
        .count();
    if ident_len == 0 {
        return None;
    }
    let rest = block[ident_len..].strip_prefix(':')?;
    Some((&block[..ident_len], rest.trim_start()))
}

fn starts_with_speaker(text: &str) -> bool {
    let ident_len = text
        .bytes()
        .take_while(|&b| is_speaker_byte(b))
        .count();
    ident_len > 0 && text.as_bytes().get(ident_len) == Some(&b':')
}

fn is_speaker_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_single_turn() {
        let turns = parse_text("ALICE: hi there");
        assert_eq!(
            turns,
            vec![Turn {
                speaker: "ALICE".to_string(),
                utterance: "hi there".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_text_multiple_turns() {
        let turns = parse_text("ALICE: hi\n\nBOB: hello\n\nALICE: bye");
        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["ALICE", "BOB", "ALICE"]);
    }

    #[test]
    fn test_parse_text_keeps_internal_blank_lines_in_one_turn() {
        // The blank line is not followed by a speaker prefix, so the turn is
        // not fragmented; the run collapses to the break marker instead.
        let turns = parse_text("ALICE: first paragraph\n\nsecond paragraph\n\nBOB: ok");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].utterance, "first paragraph\n\tsecond paragraph");
        assert_eq!(turns[1].utterance, "ok");
    }

    #[test]
    fn test_parse_text_skips_malformed_block() {
        let turns = parse_text("not a speaker line\n\nALICE: hi");
        assert_eq!(
            turns,
            vec![Turn {
                speaker: "ALICE".to_string(),
                utterance: "hi".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_text_soft_breaks_survive() {
        let turns = parse_text("ALICE: line one\nline two");
        assert_eq!(turns[0].utterance, "line one\nline two");
    }

    #[test]
    fn test_parse_text_triple_newline_boundary() {
        let turns = parse_text("ALICE: hi\n\n\nBOB: hello");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].utterance, "hi");
        assert_eq!(turns[1].utterance, "hello");
    }

    #[test]
    fn test_parse_text_empty_input() {
        assert!(parse_text("").is_empty());
        assert!(parse_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_parse_text_no_turns_is_not_an_error() {
        // A block without a speaker prefix is skipped, yielding an empty set.
        assert!(parse_text("just prose, no speakers").is_empty());
    }

    #[test]
    fn test_parse_markup_basic() {
        let markup = "<p class=\"dialogue\"><span class=\"speaker\">ALICE</span> hi there</p>";
        let turns = parse_markup(markup);
        assert_eq!(
            turns,
            vec![Turn {
                speaker: "ALICE".to_string(),
                utterance: "hi there".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_markup_skips_paragraph_without_label() {
        let markup = concat!(
            "<p class=\"dialogue\">orphan text</p>\n",
            "<p class=\"dialogue\"><span class=\"speaker\">BOB</span> hello</p>",
        );
        let turns = parse_markup(markup);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, "BOB");
    }

    #[test]
    fn test_parse_markup_ignores_non_dialogue_paragraphs() {
        let markup = concat!(
            "<p>preamble</p>",
            "<p class=\"dialogue\"><span class=\"speaker\">EVE</span> hey</p>",
        );
        assert_eq!(parse_markup(markup).len(), 1);
    }

    #[test]
    fn test_parse_markup_decodes_breaks_and_entities() {
        let markup = "<p class=\"dialogue\"><span class=\"speaker\">ALICE</span> \
                      one<br />two<br />&emsp;three &amp; four</p>";
        let turns = parse_markup(markup);
        assert_eq!(turns[0].utterance, "one\ntwo\n\tthree & four");
    }

    #[test]
    fn test_parse_markup_empty_input() {
        assert!(parse_markup("").is_empty());
        assert!(parse_markup("   ").is_empty());
    }

    #[test]
    fn test_collapse_paragraph_breaks() {
        assert_eq!(collapse_paragraph_breaks("a\n\nb"), "a\n\tb");
        assert_eq!(collapse_paragraph_breaks("a\n\n\n\nb"), "a\n\tb");
        assert_eq!(collapse_paragraph_breaks("a\nb"), "a\nb");
        assert_eq!(collapse_paragraph_breaks("\n\na\n\n"), "a");
    }
}
