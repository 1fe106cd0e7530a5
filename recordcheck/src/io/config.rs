//! Tool configuration stored in `.recordcheck.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::process::ProcessLimits;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".recordcheck.toml";

/// Tool configuration (TOML). Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub git: GitConfig,
}

/// Report rendering for `recordcheck check`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Wall-clock budget for a single git invocation.
    pub timeout_secs: u64,

    /// Keep at most this many bytes of git stdout/stderr.
    pub output_limit_bytes: usize,

    /// Number of commits `recordcheck repo` lists by default.
    pub log_entries: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            output_limit_bytes: 1_000_000,
            log_entries: 5,
        }
    }
}

impl GitConfig {
    pub fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.git.timeout_secs == 0 {
            return Err(anyhow!("git.timeout_secs must be > 0"));
        }
        if self.git.output_limit_bytes == 0 {
            return Err(anyhow!("git.output_limit_bytes must be > 0"));
        }
        if self.git.log_entries == 0 {
            return Err(anyhow!("git.log_entries must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
