use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ShortenError;
use crate::key::effective_length;
use crate::paths::{config_path, ledger_path};

pub use crate::key::{DEFAULT_KEY_LENGTH, MAX_KEY_LENGTH};

/// Top-level configuration structure loaded from the netshort TOML file.
///
/// Example TOML:
/// ```toml
/// [app]
/// path = "/home/me/sites/links"
///
/// [shortlink]
/// length = 6
///
/// [git]
/// remote = "origin"
/// branch = "master"
/// ```
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub shortlink: Shortlink,
    #[serde(default)]
    pub git: Git,
}

/// `[app]` section: where the site lives.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct App {
    /// Directory containing the `_redirects` ledger.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[shortlink]` section.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Shortlink {
    #[serde(default)]
    pub length: usize,
}

/// `[git]` section: how a rewritten ledger is published.
#[derive(Debug, Deserialize, Clone)]
pub struct Git {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Branch to push. `None` pushes whatever branch HEAD points at.
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for Git {
    fn default() -> Self {
        Git {
            enabled: true,
            remote: default_remote(),
            branch: None,
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_author_name() -> String {
    "netshort".to_string()
}

fn default_author_email() -> String {
    "netshort@localhost".to_string()
}

impl Config {
    /// Parse a config from TOML text.
    ///
    /// # Errors
    /// Returns an error on invalid TOML or an out-of-range `shortlink.length`.
    pub fn from_toml(txt: &str) -> Result<Config> {
        let cfg: Config = toml::from_str(txt).context("failed to parse netshort config")?;
        effective_length(cfg.shortlink.length).context("invalid shortlink.length")?;
        Ok(cfg)
    }

    /// Apply `NETSHORT_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    /// Returns an error if a numeric or boolean override cannot be parsed, or
    /// if the key length is out of range.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NETSHORT_APP_PATH").filter(|v| !v.is_empty()) {
            self.app.path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("NETSHORT_SHORTLINK_LENGTH") {
            self.shortlink.length = v
                .trim()
                .parse()
                .with_context(|| format!("NETSHORT_SHORTLINK_LENGTH is not a number: {v}"))?;
            effective_length(self.shortlink.length)
                .context("invalid NETSHORT_SHORTLINK_LENGTH")?;
        }
        if let Some(v) = lookup("NETSHORT_GIT_ENABLED") {
            self.git.enabled = parse_bool(&v)
                .ok_or_else(|| anyhow!("NETSHORT_GIT_ENABLED is not a boolean: {v}"))?;
        }
        if let Some(v) = lookup("NETSHORT_GIT_REMOTE").filter(|v| !v.is_empty()) {
            self.git.remote = v;
        }
        if let Some(v) = lookup("NETSHORT_GIT_BRANCH").filter(|v| !v.is_empty()) {
            self.git.branch = Some(v);
        }
        Ok(())
    }

    /// Effective key length; 0 means the default.
    pub fn key_length(&self) -> usize {
        effective_length(self.shortlink.length).unwrap_or(DEFAULT_KEY_LENGTH)
    }

    /// Resolved ledger file path.
    ///
    /// # Errors
    /// [`ShortenError::LedgerUnconfigured`] when `app.path` is not set.
    pub fn ledger_path(&self) -> Result<PathBuf, ShortenError> {
        self.app
            .path
            .as_deref()
            .map(ledger_path)
            .ok_or(ShortenError::LedgerUnconfigured)
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load the config file and apply environment overrides.
///
/// # Errors
/// - The file was requested explicitly (flag or `$NETSHORT_CONFIG`) but is missing.
/// - The file exists but cannot be read or parsed.
/// - An environment override is malformed.
///
/// # Notes
/// A missing default config file is fine: defaults plus environment apply.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let (path, required) = config_path(explicit);
    let mut cfg = match fs::read_to_string(&path) {
        Ok(txt) => Config::from_toml(&txt)
            .with_context(|| format!("in config file {}", path.display()))?,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("config not found: {}", path.display()));
        }
    };
    cfg.apply_env(|k| std::env::var(k).ok())?;
    tracing::info!(config = %path.display(), "configuration loaded");
    Ok(cfg)
}
