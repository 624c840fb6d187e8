//! Configuration management for multilogue.
//!
//! Loads configuration from `${MULTILOGUE_HOME}/config.toml` with sensible
//! defaults. The core only reads these values; nothing here is persisted on
//! its behalf.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Instruction used when no instruction file is configured or readable.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Filesystem locations for multilogue state.
///
/// Resolution order:
/// 1. `MULTILOGUE_HOME` environment variable (if set)
/// 2. `~/.config/multilogue`
pub mod paths {
    use std::path::PathBuf;

    /// Returns the multilogue home directory.
    pub fn multilogue_home() -> PathBuf {
        if let Ok(home) = std::env::var("MULTILOGUE_HOME") {
            return PathBuf::from(home);
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config").join("multilogue"),
            Err(_) => PathBuf::from(".multilogue"),
        }
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        multilogue_home().join("config.toml")
    }
}

/// Identity of the machine participant in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Display name of the assistant, used for role assignment.
    pub name: String,
    /// Model requested when the generation settings do not override it.
    pub model: String,
    /// Base URL of the chat-completion API.
    pub base_url: String,
    /// Path to a plain-text instruction file read before each request.
    pub instructions_path: Option<PathBuf>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "Machine".to_string(),
            model: "gpt-5".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            instructions_path: None,
        }
    }
}

/// Generation parameters read by the outbound client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model override; falls back to the machine's default model.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum output token budget.
    pub max_output_tokens: Option<u32>,
    /// Reasoning effort ("low", "medium", "high").
    pub reasoning_effort: Option<String>,
    /// Reasoning summary verbosity ("auto", "concise", "detailed").
    pub reasoning_summary: Option<String>,
    /// API key; falls back to the `OPENAI_API_KEY` environment variable.
    pub api_key: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub machine: MachineConfig,
    pub llm: LlmSettings,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error when the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        Self::write_config(path, CONFIG_TEMPLATE)
    }

    /// Writes config content to a file, creating parent directories as
    /// needed. Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move config into place at {}", path.display()))
    }
}

/// Commented template written by `Config::init`.
const CONFIG_TEMPLATE: &str = r#"# multilogue configuration

[machine]
# Display name of the assistant participant; transcript turns with this
# speaker are sent as the assistant side of the conversation.
name = "Machine"
# Default model requested when [llm].model is unset.
model = "gpt-5"
# Base URL of the chat-completion API.
base_url = "https://api.openai.com/v1"
# Optional path to a plain-text instruction file.
# instructions_path = "/path/to/instructions.txt"

[llm]
# model = "gpt-5"
# temperature = 1.0
# max_output_tokens = 8192
# reasoning_effort = "high"
# reasoning_summary = "detailed"
# API key; OPENAI_API_KEY is consulted when unset.
# api_key = ""
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_missing_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.machine.name, "Machine");
        assert!(config.llm.model.is_none());
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[machine]\nname = \"HAL\"\n\n[llm]\ntemperature = 0.5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.machine.name, "HAL");
        assert_eq!(config.machine.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.temperature, Some(0.5));
    }

    #[test]
    fn test_init_writes_parseable_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.machine.name, "Machine");

        // Refuses to clobber an existing file.
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "machine = not toml").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
