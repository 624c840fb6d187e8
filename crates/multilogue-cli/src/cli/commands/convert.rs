//! Convert command handler.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use multilogue_core::config::{Config, paths};
use multilogue_core::convert;

pub struct ConvertOptions<'a> {
    pub input: &'a str,
    pub to: &'a str,
    pub from: Option<&'a str>,
    pub assistant: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub config: Option<&'a Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Text,
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetFormat {
    Text,
    Html,
    Cmj,
    Muj,
    Mpuj,
}

pub fn run(options: ConvertOptions<'_>) -> Result<()> {
    let source = resolve_source(options.from, options.input)?;
    let target = parse_target(options.to)?;
    let raw = read_input(options.input)?;

    let rendered = match target {
        TargetFormat::Text => match source {
            SourceFormat::Text => raw,
            SourceFormat::Html => convert::plato_html_to_plato_text(&raw),
        },
        TargetFormat::Html => match source {
            SourceFormat::Text => convert::plato_text_to_plato_html(&raw),
            SourceFormat::Html => raw,
        },
        TargetFormat::Cmj | TargetFormat::Muj | TargetFormat::Mpuj => {
            let assistant = resolve_assistant(options.assistant, options.config)?;
            render_messages(&raw, source, target, &assistant)?
        }
    };

    write_output(options.output, &rendered)
}

/// Resolves the assistant name: flag first, then the config file.
fn resolve_assistant(flag: Option<&str>, config_path: Option<&Path>) -> Result<String> {
    if let Some(name) = flag {
        return Ok(name.to_string());
    }
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load_from(&paths::config_path())?,
    };
    Ok(config.machine.name)
}

fn render_messages(
    raw: &str,
    source: SourceFormat,
    target: TargetFormat,
    assistant: &str,
) -> Result<String> {
    let json = match (target, source) {
        (TargetFormat::Cmj, SourceFormat::Text) => {
            serde_json::to_string_pretty(&convert::plato_text_to_cmj(raw, assistant)?)
        }
        (TargetFormat::Cmj, SourceFormat::Html) => {
            serde_json::to_string_pretty(&convert::plato_html_to_cmj(raw, assistant)?)
        }
        (TargetFormat::Muj, SourceFormat::Text) => {
            serde_json::to_string_pretty(&convert::plato_text_to_muj(raw, assistant)?)
        }
        (TargetFormat::Muj, SourceFormat::Html) => {
            serde_json::to_string_pretty(&convert::plato_html_to_muj(raw, assistant)?)
        }
        (TargetFormat::Mpuj, SourceFormat::Html) => {
            serde_json::to_string_pretty(&convert::plato_html_to_mpuj(raw, assistant)?)
        }
        (TargetFormat::Mpuj, SourceFormat::Text) => {
            // MPUJ is defined over the markup form; render it first.
            let markup = convert::plato_text_to_plato_html(raw);
            serde_json::to_string_pretty(&convert::plato_html_to_mpuj(&markup, assistant)?)
        }
        (TargetFormat::Text | TargetFormat::Html, _) => unreachable!("handled by caller"),
    };
    json.context("serialize messages")
}

fn resolve_source(from: Option<&str>, input: &str) -> Result<SourceFormat> {
    if let Some(raw) = from {
        return match raw.to_lowercase().as_str() {
            "text" | "txt" | "plato" => Ok(SourceFormat::Text),
            "html" | "markup" => Ok(SourceFormat::Html),
            other => bail!("unknown source format '{other}' (expected text or html)"),
        };
    }
    let lowered = input.to_lowercase();
    if lowered.ends_with(".html") || lowered.ends_with(".htm") {
        Ok(SourceFormat::Html)
    } else {
        Ok(SourceFormat::Text)
    }
}

fn parse_target(raw: &str) -> Result<TargetFormat> {
    match raw.to_lowercase().as_str() {
        "text" | "txt" | "plato" => Ok(TargetFormat::Text),
        "html" | "markup" => Ok(TargetFormat::Html),
        "cmj" => Ok(TargetFormat::Cmj),
        "muj" => Ok(TargetFormat::Muj),
        "mpuj" => Ok(TargetFormat::Mpuj),
        other => bail!("unknown target format '{other}' (expected text, html, cmj, muj, or mpuj)"),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("read input file {input}"))
    }
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("write output file {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
