//! Extractor configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::atomic::DEFAULT_PERMISSIONS;

/// Errors raised while loading a [`ReadabilityConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for readability extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityConfig {
    /// Whether readability extraction runs at all
    pub enabled: bool,

    /// Path or name of the extractor binary
    pub binary: PathBuf,

    /// Version string recorded in results
    pub version: Option<String>,

    /// Default timeout in seconds
    pub timeout_secs: u64,

    /// User agent for document downloads
    pub user_agent: String,

    /// Whether to follow redirects when downloading
    pub follow_redirects: bool,

    /// Maximum redirects to follow
    pub max_redirects: usize,

    /// Unix mode of written artifacts
    pub output_permissions: u32,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: PathBuf::from("readability-extractor"),
            version: None,
            timeout_secs: 60,
            user_agent: format!(
                "HanzoReadability/{} (https://hanzo.ai)",
                env!("CARGO_PKG_VERSION")
            ),
            follow_redirects: true,
            max_redirects: 5,
            output_permissions: DEFAULT_PERMISSIONS,
        }
    }
}

impl ReadabilityConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay `SAVE_READABILITY`, `READABILITY_BINARY`,
    /// `READABILITY_VERSION`, `TIMEOUT`, `USER_AGENT` and
    /// `OUTPUT_PERMISSIONS` (octal, e.g. `644`) from `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SAVE_READABILITY") {
            match parse_bool(&value) {
                Some(enabled) => self.enabled = enabled,
                None => tracing::warn!(value = %value, "ignoring invalid SAVE_READABILITY"),
            }
        }
        if let Some(value) = lookup("READABILITY_BINARY") {
            if !value.trim().is_empty() {
                self.binary = PathBuf::from(value.trim());
            }
        }
        if let Some(value) = lookup("READABILITY_VERSION") {
            let value = value.trim();
            self.version = (!value.is_empty()).then(|| value.to_string());
        }
        if let Some(value) = lookup("TIMEOUT") {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => tracing::warn!(value = %value, "ignoring invalid TIMEOUT"),
            }
        }
        if let Some(value) = lookup("USER_AGENT") {
            if !value.trim().is_empty() {
                self.user_agent = value.trim().to_string();
            }
        }
        if let Some(value) = lookup("OUTPUT_PERMISSIONS") {
            match u32::from_str_radix(value.trim(), 8) {
                Ok(mode) if mode <= 0o777 => self.output_permissions = mode,
                _ => tracing::warn!(value = %value, "ignoring invalid OUTPUT_PERMISSIONS"),
            }
        }
        self
    }

    /// Enable or disable extraction
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the extractor binary
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the recorded tool version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Create a new config with custom timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the download user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the mode of written artifacts
    pub fn with_output_permissions(mut self, mode: u32) -> Self {
        self.output_permissions = mode;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
