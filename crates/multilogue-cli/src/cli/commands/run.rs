//! Run command handler: one machine turn against the configured API.

use std::path::Path;

use anyhow::{Context, Result, bail};
use multilogue_core::config::{Config, paths};
use multilogue_core::machine;

pub struct RunOptions<'a> {
    pub file: &'a Path,
    pub model: Option<&'a str>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub effort: Option<&'a str>,
    pub thoughts: Option<&'a Path>,
    pub config: Option<&'a Path>,
}

pub async fn run(options: RunOptions<'_>) -> Result<()> {
    let config_path = options
        .config
        .map_or_else(paths::config_path, Path::to_path_buf);
    let config = apply_overrides(Config::load_from(&config_path)?, &options);

    let transcript = std::fs::read_to_string(options.file)
        .with_context(|| format!("read transcript {}", options.file.display()))?;
    if transcript.trim().is_empty() {
        bail!("transcript {} is empty", options.file.display());
    }

    let http = reqwest::Client::new();
    let outcome = machine::run_turn(&http, &config, &transcript).await?;

    std::fs::write(options.file, &outcome.transcript)
        .with_context(|| format!("write transcript {}", options.file.display()))?;

    if let Some(thoughts_path) = options.thoughts {
        std::fs::write(thoughts_path, &outcome.thoughts)
            .with_context(|| format!("write thoughts {}", thoughts_path.display()))?;
    } else if !outcome.thoughts.is_empty() {
        eprintln!("--- thoughts ---\n{}", outcome.thoughts);
    }

    println!("{}", outcome.transcript.trim_end());
    Ok(())
}

/// Command-line overrides win over the config file, field by field.
fn apply_overrides(mut config: Config, options: &RunOptions<'_>) -> Config {
    if let Some(model) = options.model {
        config.llm.model = Some(model.to_string());
    }
    if let Some(temperature) = options.temperature {
        config.llm.temperature = Some(temperature);
    }
    if let Some(max_output_tokens) = options.max_output_tokens {
        config.llm.max_output_tokens = Some(max_output_tokens);
    }
    if let Some(effort) = options.effort {
        config.llm.reasoning_effort = Some(effort.to_string());
    }
    config
}
