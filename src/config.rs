use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::ExpenseRules;

/// Runtime settings, read from `<config dir>/config.json` and then
/// overridden by `SPENDLOG_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Database file. Defaults to `spendlog.db` in the platform data dir.
    pub(crate) db_path: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `info` or `spendlog=debug`.
    pub(crate) log_filter: String,
    pub(crate) busy_timeout_ms: u64,
    /// Accept zero and negative amounts.
    pub(crate) allow_non_positive_amounts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            log_filter: "warn".into(),
            busy_timeout_ms: 5000,
            allow_non_positive_amounts: false,
        }
    }
}

impl Config {
    pub(crate) fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join("config.json");
        Self::load_from(&path)?.apply_env(|key| std::env::var(key).ok())
    }

    /// Read a config file. A missing file yields the defaults.
    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(db) = var("SPENDLOG_DB") {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(filter) = var("SPENDLOG_LOG").or_else(|| var("RUST_LOG")) {
            self.log_filter = filter;
        }
        if let Some(ms) = var("SPENDLOG_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("SPENDLOG_BUSY_TIMEOUT_MS: not a number: {ms}"))?;
        }
        if let Some(flag) = var("SPENDLOG_ALLOW_NON_POSITIVE") {
            self.allow_non_positive_amounts = parse_bool(&flag)
                .with_context(|| format!("SPENDLOG_ALLOW_NON_POSITIVE: not a boolean: {flag}"))?;
        }
        Ok(self)
    }

    /// The database file to open, creating the default data directory
    /// when no explicit path is configured.
    pub(crate) fn db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let proj_dirs = project_dirs()?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(data_dir.join("spendlog.db"))
    }

    pub(crate) fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub(crate) fn expense_rules(&self) -> ExpenseRules {
        ExpenseRules {
            allow_non_positive_amounts: self.allow_non_positive_amounts,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "spendlog", "spendlog")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
