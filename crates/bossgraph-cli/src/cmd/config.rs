//! `bossgraph config` — show the effective or a single-layer configuration.

use std::path::Path;

use anyhow::{Context, Result};
use bossgraph_core::config::{Config, load_project_config, load_user_config};
use clap::Args;

use crate::output::OutputMode;

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Show the project file only
    #[arg(long, conflicts_with = "user")]
    project: bool,

    /// Show the user file only
    #[arg(long)]
    user: bool,
}

pub fn run_config(
    args: &ConfigArgs,
    effective: &Config,
    project_root: &Path,
    output: OutputMode,
) -> Result<()> {
    let shown = if args.project {
        load_project_config(project_root)?
    } else if args.user {
        load_user_config()?
    } else {
        effective.clone()
    };

    print_config(&shown, output)
}

fn print_config(config: &Config, output: OutputMode) -> Result<()> {
    println!("{}", format_config(config, output)?);
    Ok(())
}

fn format_config(config: &Config, output: OutputMode) -> Result<String> {
    if output.is_json() {
        serde_json::to_string_pretty(config).context("Failed to serialize config")
    } else {
        let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
        Ok(rendered.trim_end().to_string())
    }
}
