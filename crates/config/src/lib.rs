//! Configuration loading, validation, and management for EcoPulse.
//!
//! Loads configuration from `~/.ecopulse/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use ecopulse_core::AnalysisMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ecopulse/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model used for analysis and chat
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Per-call timeout wrapped around the provider (0 = none)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Insight analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Synthetic telemetry source settings
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_request_timeout_secs() -> u64 {
    60
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("analysis", &self.analysis)
            .field("simulator", &self.simulator)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Mode used when the CLI is not told otherwise
    #[serde(default)]
    pub default_mode: AnalysisMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Hours of history behind the current sample
    #[serde(default = "default_history_points")]
    pub history_points: usize,

    /// Fixed RNG seed for reproducible telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Seconds between simulated snapshots in `watch` mode
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_history_points() -> usize {
    24
}
fn default_tick_interval_secs() -> u64 {
    30
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            history_points: default_history_points(),
            seed: None,
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ecopulse/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `ECOPULSE_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = ["ECOPULSE_API_KEY", "GEMINI_API_KEY", "API_KEY"]
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.is_empty()));
        }

        if let Some(provider) = lookup("ECOPULSE_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("ECOPULSE_MODEL") {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ecopulse")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.history_points == 0 {
            return Err(ConfigError::ValidationError(
                "simulator.history_points must be at least 1".into(),
            ));
        }

        if self.simulator.tick_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "simulator.tick_interval_secs must be > 0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            api_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            analysis: AnalysisConfig::default(),
            simulator: SimulatorConfig::default(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert_eq!(config.simulator.history_points, 24);
        assert_eq!(config.analysis.default_mode, AnalysisMode::Analytical);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.simulator.tick_interval_secs, config.simulator.tick_interval_secs);
    }

    #[test]
    fn empty_history_window_rejected() {
        let config = AppConfig {
            simulator: SimulatorConfig {
                history_points: 0,
                ..SimulatorConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn load_from_file_parses_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gemini-2.5-flash"
request_timeout_secs = 15

[analysis]
default_mode = "storytelling"

[simulator]
history_points = 12
seed = 7
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.analysis.default_mode, AnalysisMode::Storytelling);
        assert_eq!(config.simulator.history_points, 12);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.simulator.tick_interval_secs, 30);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_fill_missing_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_API_KEY", "gm-key"),
            ("API_KEY", "generic"),
            ("ECOPULSE_MODEL", "gemini-2.5-pro"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("gm-key"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn file_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|_| Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("secret-value".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("history_points"));
    }
}
