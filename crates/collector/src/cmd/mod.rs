//! Subcommands

pub mod check;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use logfan_config::Config;

/// Load and validate the configuration file
pub fn load_config(path: &Path) -> Result<Config> {
    Config::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}
