//! Configuration file parser for the sl-feeds TOML config.
//!
//! Key names match the original sl-feeds format (`Dest`, `Quiet`,
//! `[[Mirrors]]` with `URL`, `Releases`, `Prefix`) and lowercase aliases
//! are accepted. Unknown keys are ignored with a warning.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::{LocationError, SourceLocation};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid mirror configuration: {0}")]
    Source(#[from] LocationError),

    #[error("Two releases would write the same feed file {0:?}; set a Prefix on one mirror")]
    DuplicateFeed(String),

    #[error("Cannot expand destination {dest:?}: {reason}")]
    Dest { dest: String, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration: where feeds are written and which mirrors to follow.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suppress informational output, including "not newer" notices.
    #[serde(rename = "Quiet", alias = "quiet")]
    pub quiet: bool,

    /// Output directory for `.rss` files. `~` and `$VARS` are expanded.
    #[serde(rename = "Dest", alias = "dest")]
    pub dest: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(rename = "TimeoutSeconds", alias = "timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(rename = "Mirrors", alias = "mirrors")]
    pub mirrors: Vec<Mirror>,
}

/// A mirror hosting `{URL}/{release}/ChangeLog.txt` for each listed release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,

    #[serde(rename = "Releases", alias = "releases", default)]
    pub releases: Vec<String>,

    /// Prepended to local feed file names, e.g. `alphageek-` gives
    /// `alphageek-slackware64-14.2.rss`.
    #[serde(
        rename = "Prefix",
        alias = "prefix",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiet: false,
            dest: ".".to_string(),
            timeout_seconds: 30,
            mirrors: Vec::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "Quiet",
        "quiet",
        "Dest",
        "dest",
        "TimeoutSeconds",
        "timeout_seconds",
        "Mirrors",
        "mirrors",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`; the caller asked for this file
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            mirrors = config.mirrors.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The sample configuration printed by `--sample-config`.
    pub fn sample() -> Self {
        fn mirror(url: &str, prefix: &str, releases: &[&str]) -> Mirror {
            Mirror {
                url: url.to_string(),
                releases: releases.iter().map(|r| r.to_string()).collect(),
                prefix: prefix.to_string(),
            }
        }

        Self {
            quiet: false,
            dest: "$HOME/public_html/feeds/".to_string(),
            timeout_seconds: 30,
            mirrors: vec![
                mirror(
                    "http://slackware.osuosl.org/",
                    "",
                    &[
                        "slackware-14.0",
                        "slackware-14.1",
                        "slackware-14.2",
                        "slackware-current",
                        "slackware64-14.0",
                        "slackware64-14.1",
                        "slackware64-14.2",
                        "slackware64-current",
                    ],
                ),
                mirror(
                    "http://ftp.arm.slackware.com/slackwarearm/",
                    "",
                    &["slackwarearm-14.2", "slackwarearm-current"],
                ),
                mirror(
                    "http://alphageek.noip.me/mirrors/alphageek/",
                    "alphageek-",
                    &["slackware64-14.2"],
                ),
            ],
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Destination directory with `~` and environment variables expanded.
    pub fn dest_dir(&self) -> Result<PathBuf, ConfigError> {
        let expanded = shellexpand::full(&self.dest).map_err(|e| ConfigError::Dest {
            dest: self.dest.clone(),
            reason: e.to_string(),
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Every (mirror, release) pair in config order, validated.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Source`] for a bad mirror URL, release or prefix
    /// - [`ConfigError::DuplicateFeed`] when two pairs map to the same file
    pub fn sources(&self) -> Result<Vec<SourceLocation>, ConfigError> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();

        for mirror in &self.mirrors {
            for release in &mirror.releases {
                let source = SourceLocation::new(&mirror.url, release, &mirror.prefix)?;
                if !seen.insert(source.file_name()) {
                    return Err(ConfigError::DuplicateFeed(source.file_name()));
                }
                sources.push(source);
            }
        }

        Ok(sources)
    }
}

// ============================================================================
// Tests
// ============================================================================
