//! One full machine turn: transcript out, updated transcript back.
//!
//! The cycle mirrors the editing loop the transcript lives in: fold the
//! PlatoText transcript into request messages, make exactly one request,
//! normalize whatever prose the model produced, and append it as the
//! machine's turn so the result is again a valid PlatoText transcript.

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::config::{Config, DEFAULT_INSTRUCTIONS};
use crate::convert::{self, Message, Role};
use crate::normalize::normalize;
use crate::providers::{self, responses};

/// Result of one completed turn cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Updated PlatoText transcript with the machine's reply appended.
    pub transcript: String,
    /// Normalized reasoning summary; empty when the model reported none.
    pub thoughts: String,
}

/// Reads the configured instruction file.
///
/// Falls back to the default instruction when no file is configured, the
/// file is unreadable, or it holds only whitespace.
pub fn load_instructions(config: &Config) -> String {
    let Some(path) = config.machine.instructions_path.as_deref() else {
        return DEFAULT_INSTRUCTIONS.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                DEFAULT_INSTRUCTIONS.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(e) => {
            warn!(
                "failed to read instructions from {}: {e}; using default",
                path.display()
            );
            DEFAULT_INSTRUCTIONS.to_string()
        }
    }
}

/// Runs one turn cycle against the configured chat-completion API.
///
/// # Errors
/// Fails on an empty transcript, a missing assistant name or API key, a
/// request failure, or a reply with no visible message text.
pub async fn run_turn(
    http: &reqwest::Client,
    config: &Config,
    plato_text: &str,
) -> Result<TurnOutcome> {
    if plato_text.trim().is_empty() {
        bail!("transcript is empty; nothing to send");
    }
    let machine_name = config.machine.name.as_str();

    let turns = convert::plato_text_to_muj(plato_text, machine_name)?;
    let mut messages = convert::plato_text_to_cmj(plato_text, machine_name)?;

    providers::validate_base_url(&config.machine.base_url)?;
    let api_key = providers::resolve_api_key(config.llm.api_key.as_deref(), "OPENAI_API_KEY")?;
    let instructions = load_instructions(config);
    let request = responses::build_request(&config.machine, &config.llm, &instructions, turns);

    let items = responses::send_message(http, &config.machine.base_url, &api_key, &request)
        .await
        .context("chat-completion request failed")?;

    let reply = normalize(&responses::collect_message_text(&items));
    let thoughts = normalize(&responses::collect_reasoning_text(&items));
    if reply.is_empty() {
        bail!("model response contained no message text");
    }

    messages.push(Message {
        role: Role::Assistant,
        name: machine_name.to_string(),
        content: reply,
    });

    Ok(TurnOutcome {
        transcript: convert::cmj_to_plato_text(&messages),
        thoughts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_instructions_default_when_unconfigured() {
        let config = Config::default();
        assert_eq!(load_instructions(&config), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_load_instructions_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Answer in rhyme.  ").unwrap();

        let mut config = Config::default();
        config.machine.instructions_path = Some(file.path().to_path_buf());
        assert_eq!(load_instructions(&config), "Answer in rhyme.");
    }

    #[test]
    fn test_load_instructions_default_on_missing_file() {
        let mut config = Config::default();
        config.machine.instructions_path = Some("/nonexistent/instructions.txt".into());
        assert_eq!(load_instructions(&config), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_load_instructions_default_on_blank_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   \n  ").unwrap();

        let mut config = Config::default();
        config.machine.instructions_path = Some(file.path().to_path_buf());
        assert_eq!(load_instructions(&config), DEFAULT_INSTRUCTIONS);
    }

    #[tokio::test]
    async fn test_run_turn_rejects_empty_transcript() {
        let http = reqwest::Client::new();
        let config = Config::default();
        let err = run_turn(&http, &config, "  \n ").await.unwrap_err();
        assert!(err.to_string().contains("transcript is empty"));
    }
}
