//! Non-streaming client for an OpenAI-compatible Responses API.
//!
//! One transcript is submitted per call and exactly one request is made:
//! failures surface as structured errors and are never retried here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderError, ProviderErrorKind, ProviderResult, USER_AGENT, classify_reqwest_error};
use crate::config::{LlmSettings, MachineConfig};
use crate::convert::ChatTurn;

/// Path appended to the configured base URL.
const RESPONSES_PATH: &str = "/responses";

/// User prompt substituted when a transcript folds to no turns.
const DEFAULT_USER_PROMPT: &str = "What model are you?";

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f64 = 1.0;
const DEFAULT_REASONING_EFFORT: &str = "high";
const DEFAULT_REASONING_SUMMARY: &str = "detailed";

/// Request payload for one response generation.
#[derive(Debug, Serialize)]
pub struct RequestBody {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
    pub input: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ReasoningConfig {
    pub effort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Builds the request payload from config, settings, and folded turns.
///
/// The system instruction is prepended as its own input entry. An empty turn
/// list is replaced by a default user prompt so the request stays valid.
pub fn build_request(
    machine: &MachineConfig,
    settings: &LlmSettings,
    instructions: &str,
    turns: Vec<ChatTurn>,
) -> RequestBody {
    let mut input = Vec::with_capacity(turns.len() + 1);
    input.push(ChatTurn::system(instructions));
    if turns.is_empty() {
        input.push(ChatTurn::user(DEFAULT_USER_PROMPT));
    } else {
        input.extend(turns);
    }

    RequestBody {
        model: settings
            .model
            .clone()
            .unwrap_or_else(|| machine.model.clone()),
        max_output_tokens: Some(
            settings
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        ),
        temperature: Some(settings.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        reasoning: Some(ReasoningConfig {
            effort: settings
                .reasoning_effort
                .clone()
                .unwrap_or_else(|| DEFAULT_REASONING_EFFORT.to_string()),
            summary: Some(
                settings
                    .reasoning_summary
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REASONING_SUMMARY.to_string()),
            ),
        }),
        input,
    }
}

/// Response envelope: the ordered list of generated output items.
#[derive(Debug, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// One generated output item, tagged by kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Visible message content.
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    /// Reasoning summary content.
    Reasoning {
        #[serde(default)]
        summary: Vec<SummaryPart>,
    },
    /// Item kinds this client does not consume.
    #[serde(other)]
    Unknown,
}

/// Text part inside a message output item.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText { text: String },
    #[serde(other)]
    Unknown,
}

/// Summary part inside a reasoning output item.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryPart {
    #[serde(default)]
    pub text: String,
}

/// Sends one request and returns the ordered output items.
///
/// # Errors
/// Returns a structured error for transport failures, non-success statuses,
/// and unparseable response bodies.
pub async fn send_message(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    request: &RequestBody,
) -> ProviderResult<Vec<OutputItem>> {
    let url = format!("{}{RESPONSES_PATH}", base_url.trim_end_matches('/'));
    debug!(model = %request.model, "sending responses request");

    let response = http
        .post(&url)
        .bearer_auth(api_key)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(request)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::http_status(status.as_u16(), &body));
    }

    let body: ResponseBody = response.json().await.map_err(|e| {
        ProviderError::new(
            ProviderErrorKind::Parse,
            format!("Invalid response body: {e}"),
        )
    })?;

    debug!(items = body.output.len(), "responses request completed");
    Ok(body.output)
}

/// Joins the visible message text of the output items with single spaces.
pub fn collect_message_text(items: &[OutputItem]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for item in items {
        if let OutputItem::Message { content } = item {
            for part in content {
                if let ContentPart::OutputText { text } = part {
                    parts.push(text);
                }
            }
        }
    }
    parts.join(" ")
}

/// Joins the reasoning summary text of the output items with newlines.
pub fn collect_reasoning_text(items: &[OutputItem]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for item in items {
        if let OutputItem::Reasoning { summary } = item {
            for part in summary {
                if !part.text.is_empty() {
                    parts.push(&part.text);
                }
            }
        }
    }
    parts.join("\n")
}
