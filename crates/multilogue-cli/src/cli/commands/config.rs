//! Config command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use multilogue_core::config::{Config, paths};

pub fn init(path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(paths::config_path, Path::to_path_buf);
    Config::init(&path)?;
    println!("Wrote config template to {}", path.display());
    Ok(())
}

pub fn show(path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(paths::config_path, Path::to_path_buf);
    let config = Config::load_from(&path)?;
    let rendered = toml::to_string_pretty(&config).context("serialize config")?;
    println!("{rendered}");
    Ok(())
}
