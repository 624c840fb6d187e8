//! Normalizer for generated model text.
//!
//! Model output arrives as free-form Markdown-flavored prose; the transcript
//! converters expect plain text using the newline + tab paragraph convention.
//! This pipeline is the sole bridge between the two. The steps are order
//! sensitive: block-level constructs are removed before inline ones, bold
//! before italic so no stray single delimiters remain, and the paragraph
//! convention is applied last.
//!
//! Links and images are removed entirely, label included: a dialogue
//! transcript has no place for them to degrade into.

use std::sync::OnceLock;

use regex::Regex;

use crate::convert::escape::strip_tags;

/// Cleans generated model text down to the transcript's plain-text
/// conventions.
///
/// Idempotent on text that is already free of Markdown syntax.
pub fn normalize(raw: &str) -> String {
    // 1. One newline convention, runs of blank lines collapsed to one.
    let text = raw.replace("\r\n", "\n");
    let text = newline_runs_re().replace_all(&text, "\n\n");

    // 2. Fenced code blocks vanish, content included.
    let text = backtick_fence_re().replace_all(&text, "");
    let text = tilde_fence_re().replace_all(&text, "");

    // 3. HTML comments first, then any remaining tags.
    let text = comment_re().replace_all(&text, "");
    let text = strip_tags(&text);

    // 4. Horizontal rules and blockquote prefixes.
    let text = hr_re().replace_all(&text, "");
    let text = blockquote_re().replace_all(&text, "");

    // 5. Headings, both leading-hash and underline styles.
    let text = atx_heading_re().replace_all(&text, "");
    let text = setext_heading_re().replace_all(&text, "$1");

    // 6. Links and images, label and all.
    let text = link_re().replace_all(&text, "");

    // 7. Inline code, then bold, then italic.
    let text = inline_code_re().replace_all(&text, "$1");
    let text = bold_star_re().replace_all(&text, "$1");
    let text = bold_under_re().replace_all(&text, "$1");
    let text = italic_star_re().replace_all(&text, "$1");
    let text = italic_under_re().replace_all(&text, "$1");

    // 8. List markers become paragraph-internal breaks.
    let text = list_marker_re().replace_all(&text, "\t");

    // 9. Per-line whitespace cleanup, keeping the break marker.
    let text = text
        .lines()
        .map(normalize_line_whitespace)
        .collect::<Vec<_>>()
        .join("\n");

    // 10. Canonical paragraph breaks become newline + tab.
    let text = text.replace("\n\n", "\n\t");

    // 11. Final trim and marker-run collapse.
    let text = text.trim();
    tab_run_re().replace_all(text, "\n\t").into_owned()
}

/// Trims a line and collapses inner tab/space runs, preserving one leading
/// tab when the line carries the paragraph-break marker.
fn normalize_line_whitespace(line: &str) -> String {
    let marker = if line.starts_with('\t') { "\t" } else { "" };
    let body = collapse_inline_whitespace(line.trim());
    if body.is_empty() {
        return String::new();
    }
    format!("{marker}{body}")
}

/// Collapses runs of spaces and tabs into single spaces.
fn collapse_inline_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            in_run = false;
            out.push(c);
        }
    }
    out
}

fn newline_runs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("valid newline-run pattern"))
}

fn backtick_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`{3,}[^\n]*\n(?s:.*?)\n`{3,}").expect("valid fence pattern"))
}

fn tilde_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"~{3,}[^\n]*\n(?s:.*?)\n~{3,}").expect("valid fence pattern"))
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"))
}

fn hr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*[-*_]{3,}\s*$").expect("valid rule pattern"))
}

fn blockquote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*>\s*").expect("valid blockquote pattern"))
}

fn atx_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*#{1,6}\s*").expect("valid heading pattern"))
}

fn setext_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^([^\n]+)\n\s*[=-]{2,}\s*$").expect("valid heading pattern"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!?\[[^\]]*\]\([^)]*\)").expect("valid link pattern"))
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid inline-code pattern"))
}

fn bold_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+?)\*\*").expect("valid bold pattern"))
}

fn bold_under_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__([^_]+?)__").expect("valid bold pattern"))
}

fn italic_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+?)\*").expect("valid italic pattern"))
}

fn italic_under_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_([^_]+?)_").expect("valid italic pattern"))
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+").expect("valid list pattern"))
}

fn tab_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\t{2,}").expect("valid tab-run pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_list_scenario() {
        assert_eq!(
            normalize("**Hello** world\n\n- item one\n- item two"),
            "Hello world\n\titem one\n\titem two"
        );
    }

    #[test]
    fn test_idempotent_on_clean_text() {
        let inputs = [
            "Hello world\n\titem one\n\titem two",
            "plain sentence",
            "para one\n\tpara two\n\tpara three",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_windows_newlines() {
        assert_eq!(normalize("one\r\n\r\ntwo"), "one\n\ttwo");
    }

    #[test]
    fn test_paragraph_break_convention() {
        assert_eq!(normalize("one\n\ntwo\n\n\n\nthree"), "one\n\ttwo\n\tthree");
    }

    #[test]
    fn test_fenced_code_blocks_removed_entirely() {
        assert_eq!(
            normalize("before\n```rust\nlet x = 1;\n```\nafter"),
            "before\n\tafter"
        );
        assert_eq!(normalize("before\n~~~\ncode\n~~~\nafter"), "before\n\tafter");
    }

    #[test]
    fn test_html_comments_and_tags() {
        assert_eq!(
            normalize("a <!-- hidden\nnote --> b <em>kept</em> c"),
            "a b kept c"
        );
    }

    #[test]
    fn test_horizontal_rule_and_blockquote() {
        assert_eq!(normalize("one\n---\ntwo"), "one\n\ttwo");
        assert_eq!(normalize("> quoted line\nplain"), "quoted line\nplain");
    }

    #[test]
    fn test_headings() {
        assert_eq!(normalize("## Title\nbody"), "Title\nbody");
        assert_eq!(normalize("Title\n=====\nbody"), "Title\nbody");
    }

    #[test]
    fn test_links_and_images_vanish() {
        assert_eq!(normalize("see [the docs](https://example.com) here"), "see here");
        assert_eq!(normalize("![alt text](img.png) caption"), "caption");
    }

    #[test]
    fn test_inline_markers_unwrap() {
        assert_eq!(normalize("`code` **bold** *italic* __b__ _i_"), "code bold italic b i");
    }

    #[test]
    fn test_ordered_list_markers() {
        assert_eq!(normalize("intro\n\n1. first\n2. second"), "intro\n\tfirst\n\tsecond");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize("a  \t  b"), "a b");
        assert_eq!(normalize("  padded line  "), "padded line");
    }

    #[test]
    fn test_empty_and_markdown_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("```\nall code\n```"), "");
    }
}
