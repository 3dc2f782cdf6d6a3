//! Layered configuration.
//!
//! Sources, highest precedence first:
//!
//! 1. An explicit `--config <path>` file (replaces the project file).
//! 2. The project file `.bossgraph/config.toml`.
//! 3. The user file `<config_dir>/bossgraph/config.toml`.
//! 4. Built-in defaults (no limits, TTY-dependent output).
//!
//! Files are merged field by field, so a project file that only sets
//! `max_pairs` still inherits the user's `max_iterations`.
//!
//! ```toml
//! [limits]
//! max_iterations = 10000
//! max_pairs = 5000000
//! max_millis = 30000
//!
//! [output]
//! format = "json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use crate::closure::ClosureLimits;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pairs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_millis: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LimitsConfig {
    #[must_use]
    pub const fn to_limits(&self) -> ClosureLimits {
        ClosureLimits {
            max_iterations: self.max_iterations,
            max_pairs: self.max_pairs,
            max_duration: match self.max_millis {
                Some(ms) => Some(Duration::from_millis(ms)),
                None => None,
            },
        }
    }

    /// Fields set in `self` win; unset fields fall back to `lower`.
    #[must_use]
    pub fn over(self, lower: Self) -> Self {
        Self {
            max_iterations: self.max_iterations.or(lower.max_iterations),
            max_pairs: self.max_pairs.or(lower.max_pairs),
            max_millis: self.max_millis.or(lower.max_millis),
        }
    }
}

impl Config {
    /// Fields set in `self` win; unset fields fall back to `lower`.
    #[must_use]
    pub fn over(self, lower: Self) -> Self {
        Self {
            limits: self.limits.over(lower.limits),
            output: OutputConfig {
                format: self.output.format.or(lower.output.format),
            },
        }
    }
}

/// Read one config file. A missing file yields `None`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `.bossgraph/config.toml` under `project_root`, or defaults.
///
/// # Errors
///
/// Returns an error if the file exists but is unreadable or invalid.
pub fn load_project_config(project_root: &Path) -> Result<Config> {
    Ok(load_config_file(&project_root.join(".bossgraph/config.toml"))?.unwrap_or_default())
}

/// Load the per-user config, or defaults when there is none.
///
/// # Errors
///
/// Returns an error if the file exists but is unreadable or invalid.
pub fn load_user_config() -> Result<Config> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(Config::default());
    };
    Ok(load_config_file(&config_dir.join("bossgraph/config.toml"))?.unwrap_or_default())
}

/// Merge user, project and explicit config files.
///
/// # Errors
///
/// Returns an error if any present file is invalid, or if `explicit` names a
/// file that does not exist.
pub fn resolve_config(project_root: &Path, explicit: Option<&Path>) -> Result<Config> {
    let user = load_user_config()?;
    let primary = match explicit {
        Some(path) => load_config_file(path)?
            .with_context(|| format!("Config file {} does not exist", path.display()))?,
        None => load_project_config(project_root)?,
    };
    Ok(primary.over(user))
}

/// Pick the output format: CLI flag, then `FORMAT`, then config, then TTY.
///
/// Unknown values at any level are ignored and fall through.
#[must_use]
pub fn resolve_output(cli_format: Option<&str>, config: &Config) -> String {
    resolve_output_with(
        cli_format,
        env::var("FORMAT").ok().as_deref(),
        config.output.format.as_deref(),
        std::io::stdout().is_terminal(),
    )
}

fn resolve_output_with(
    cli_format: Option<&str>,
    env_format: Option<&str>,
    config_format: Option<&str>,
    is_terminal: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    [cli_format, env_format, config_format]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .unwrap_or(if is_terminal { "pretty" } else { "text" })
        .to_string()
}
