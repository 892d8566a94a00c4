//! Configuration loading, validation, and management for anchorstream.
//!
//! Loads configuration from `~/.anchorstream/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.anchorstream/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Streaming session settings
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Per-transport configurations, keyed by transport name
    #[serde(default)]
    pub transports: HashMap<String, TransportConfig>,
}

/// Settings governing a single streaming session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Initial content of the anchor message, shown until the first delta
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,

    /// Template for the user-visible failure message; `{error}` is replaced
    /// with the error's message
    #[serde(default = "default_failure_template")]
    pub failure_template: String,

    /// Content written to the anchor when the idle watchdog fires
    #[serde(default = "default_timeout_notice")]
    pub timeout_notice: String,

    /// Seconds of inactivity before an abandoned session is forced to fail.
    /// 0 disables the watchdog.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

fn default_placeholder_text() -> String {
    "…".into()
}
fn default_failure_template() -> String {
    "⚠️ Something went wrong: {error}".into()
}
fn default_timeout_notice() -> String {
    "⚠️ Response timed out.".into()
}
fn default_session_timeout_secs() -> u64 {
    300
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            placeholder_text: default_placeholder_text(),
            failure_template: default_failure_template(),
            timeout_notice: default_timeout_notice(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

/// Configuration for one messaging transport.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct TransportConfig {
    /// Bot token or API credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Allowed user IDs. Empty = deny all, ["*"] = allow all.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("streaming", &self.streaming)
            .field("transports", &self.transports)
            .finish()
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("token", &redact(&self.token))
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

impl AppConfig {
    /// The default config file path: `~/.anchorstream/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs_home().join(".anchorstream").join("config.toml")
    }

    /// Load configuration from the default path, then apply env overrides.
    ///
    /// A missing config file is not an error — defaults apply.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `ANCHORSTREAM_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ANCHORSTREAM_PLACEHOLDER_TEXT") {
            self.streaming.placeholder_text = v;
        }
        if let Ok(v) = std::env::var("ANCHORSTREAM_SESSION_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.streaming.session_timeout_secs = secs;
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.placeholder_text.is_empty() {
            return Err(ConfigError::ValidationError(
                "placeholder_text must not be empty (platforms reject empty messages)".into(),
            ));
        }

        if !self.streaming.failure_template.contains("{error}") {
            return Err(ConfigError::ValidationError(
                "failure_template must contain the {error} placeholder".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for onboarding).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            streaming: StreamingConfig::default(),
            transports: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
