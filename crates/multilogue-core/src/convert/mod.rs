//! Transcript format conversions.
//!
//! The authoritative representation is PlatoText: turns written as
//! `"speaker: utterance"` blocks separated by blank lines, with a leading tab
//! marking a paragraph-internal break inside one turn. Every other
//! representation is derived from it on demand: the PlatoHtml rendering used
//! for display and editing, and the message-array shapes consumed by
//! chat-completion APIs (CMJ with roles and names, MUJ with folded user
//! turns, MPUJ with one part per folded turn).
//!
//! Conversions preserve turn order and either fully succeed or fully fail;
//! structurally unparseable units are skipped at parse level, never surfaced
//! as partial output.

pub mod escape;
pub mod parser;
pub mod role;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use escape::{escape_markup, unescape_markup};
pub use parser::{Turn, parse_markup, parse_text};
pub use role::{Role, assign_role};

use parser::collapse_paragraph_breaks;
use role::speaker_matches;

/// Join separator for folded user lines when the source is plain text.
const TEXT_FOLD_SEPARATOR: &str = "\n";

/// Join separator for folded user lines when the source is markup.
///
/// The two source formats historically diverged here; both separators are
/// kept because consumers may depend on either.
const MARKUP_FOLD_SEPARATOR: &str = "\n\n";

/// A role-tagged, name-preserving chat message (CMJ).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub name: String,
    pub content: String,
}

/// A name-less chat turn for role/content APIs (MUJ).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Role for parts-based APIs (MPUJ), where the machine side is `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartRole {
    User,
    Model,
}

/// One text part of a folded turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A parts-based chat turn (MPUJ).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTurn {
    pub role: PartRole,
    pub parts: Vec<Part>,
}

/// Errors raised by role-assigning conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertError {
    /// The assistant name required for role assignment is missing or blank.
    MissingAssistantName,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::MissingAssistantName => {
                write!(f, "assistant name is not configured; cannot assign roles")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

fn require_assistant(assistant_name: &str) -> Result<(), ConvertError> {
    if assistant_name.trim().is_empty() {
        return Err(ConvertError::MissingAssistantName);
    }
    Ok(())
}

/// Renders a markup transcript back to PlatoText.
pub fn plato_html_to_plato_text(markup: &str) -> String {
    let mut out = String::new();
    for turn in parse_markup(markup) {
        if turn.speaker.is_empty() && turn.utterance.is_empty() {
            continue;
        }
        out.push_str(&turn.speaker);
        out.push_str(": ");
        out.push_str(&turn.utterance);
        out.push_str("\n\n");
    }
    out
}

/// Renders a PlatoText transcript as dialogue markup.
pub fn plato_text_to_plato_html(text: &str) -> String {
    let paragraphs: Vec<String> = parse_text(text)
        .into_iter()
        .map(|turn| {
            format!(
                "<p class=\"dialogue\"><span class=\"speaker\">{}</span> {}</p>",
                turn.speaker,
                escape_markup(&turn.utterance),
            )
        })
        .collect();
    paragraphs.join("\n")
}

/// Converts a markup transcript to role-tagged messages.
///
/// # Errors
/// Fails when `assistant_name` is blank.
pub fn plato_html_to_cmj(markup: &str, assistant_name: &str) -> Result<Vec<Message>, ConvertError> {
    require_assistant(assistant_name)?;
    Ok(turns_to_cmj(parse_markup(markup), assistant_name))
}

/// Converts a PlatoText transcript to role-tagged messages.
///
/// # Errors
/// Fails when `assistant_name` is blank.
pub fn plato_text_to_cmj(text: &str, assistant_name: &str) -> Result<Vec<Message>, ConvertError> {
    require_assistant(assistant_name)?;
    Ok(turns_to_cmj(parse_text(text), assistant_name))
}

fn turns_to_cmj(turns: Vec<Turn>, assistant_name: &str) -> Vec<Message> {
    turns
        .into_iter()
        .map(|turn| Message {
            role: assign_role(&turn.speaker, assistant_name),
            name: turn.speaker,
            content: turn.utterance,
        })
        .collect()
}

/// Renders role-tagged messages back to PlatoText.
///
/// Multi-newline runs in message content collapse to the paragraph-internal
/// break marker. Messages whose name trims to nothing are skipped.
pub fn cmj_to_plato_text(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        let speaker = message.name.trim();
        if speaker.is_empty() {
            warn!("skipping message with a blank speaker name");
            continue;
        }
        out.push_str(speaker);
        out.push_str(": ");
        out.push_str(&collapse_paragraph_breaks(&message.content));
        out.push_str("\n\n");
    }
    out
}

/// Converts a PlatoText transcript to folded role/content turns.
///
/// # Errors
/// Fails when `assistant_name` is blank.
pub fn plato_text_to_muj(text: &str, assistant_name: &str) -> Result<Vec<ChatTurn>, ConvertError> {
    require_assistant(assistant_name)?;
    Ok(fold_turns(parse_text(text), assistant_name, TEXT_FOLD_SEPARATOR))
}

/// Converts a markup transcript to folded role/content turns.
///
/// # Errors
/// Fails when `assistant_name` is blank.
pub fn plato_html_to_muj(markup: &str, assistant_name: &str) -> Result<Vec<ChatTurn>, ConvertError> {
    require_assistant(assistant_name)?;
    Ok(fold_turns(
        parse_markup(markup),
        assistant_name,
        MARKUP_FOLD_SEPARATOR,
    ))
}

/// Converts a markup transcript to folded parts-based turns.
///
/// Unlike MUJ folding, each buffered non-model turn stays a separate part.
///
/// # Errors
/// Fails when `assistant_name` is blank.
pub fn plato_html_to_mpuj(
    markup: &str,
    assistant_name: &str,
) -> Result<Vec<PartTurn>, ConvertError> {
    require_assistant(assistant_name)?;

    let mut out = Vec::new();
    let mut pending: Vec<Part> = Vec::new();
    for turn in parse_markup(markup) {
        if speaker_matches(&turn.speaker, assistant_name) {
            if !pending.is_empty() {
                out.push(PartTurn {
                    role: PartRole::User,
                    parts: std::mem::take(&mut pending),
                });
            }
            out.push(PartTurn {
                role: PartRole::Model,
                parts: vec![Part {
                    text: turn.utterance,
                }],
            });
        } else {
            pending.push(Part {
                text: format!("{}: {}", turn.speaker, turn.utterance),
            });
        }
    }
    if !pending.is_empty() {
        out.push(PartTurn {
            role: PartRole::User,
            parts: pending,
        });
    }

    Ok(out)
}

/// Folds turns into role/content chat turns.
///
/// Consecutive non-assistant turns buffer up as `"speaker: utterance"` lines;
/// each assistant turn flushes the buffer and then emits its bare utterance.
fn fold_turns(turns: Vec<Turn>, assistant_name: &str, separator: &str) -> Vec<ChatTurn> {
    let mut out = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for turn in turns {
        if speaker_matches(&turn.speaker, assistant_name) {
            flush_pending(&mut out, &mut pending, separator);
            out.push(ChatTurn::assistant(turn.utterance));
        } else {
            pending.push(format!("{}: {}", turn.speaker, turn.utterance));
        }
    }
    flush_pending(&mut out, &mut pending, separator);

    out
}

fn flush_pending(out: &mut Vec<ChatTurn>, pending: &mut Vec<String>, separator: &str) {
    if pending.is_empty() {
        return;
    }
    out.push(ChatTurn::user(pending.join(separator)));
    pending.clear();
}
