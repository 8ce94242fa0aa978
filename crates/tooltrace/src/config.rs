//! Configuration file support for tooltrace.
//!
//! Loads defaults from `tooltrace.toml`; command-line flags override them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Defaults loaded from `tooltrace.toml`
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolTraceConfig {
    /// Root directory scanned for session logs
    pub projects_dir: Option<PathBuf>,
    /// Rolling context window size (messages)
    pub max_context_messages: Option<usize>,
    /// Record messages seen between a tool call and its result in the trace
    pub include_messages_in_trace: Option<bool>,
    /// Files processed in parallel
    pub jobs: Option<usize>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "tooltrace.toml";

impl ToolTraceConfig {
    /// Read `tooltrace.toml` from `working_dir`, if there is one.
    ///
    /// A missing file yields `None` so flags and defaults apply. A file that
    /// exists but is not valid TOML aborts the run instead of being ignored.
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        Self::load_file(&config_path).map(Some)
    }

    /// Load an explicitly named config file. A missing file is an error here.
    pub fn load_file(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ToolTraceConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// `~/.claude/projects`, where Claude Code keeps per-session logs.
pub fn default_projects_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("projects"))
}
