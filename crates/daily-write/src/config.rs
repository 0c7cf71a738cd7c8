//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use word_ledger::RetryPolicy;

/// Name of the settings file inside the data directory
pub const SETTINGS_FILE: &str = "config.json";

/// Name of the ledger file inside the data directory
pub const LEDGER_FILE: &str = "ledger.json";

/// Settings read from `config.json` in the data directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub autosave: AutosaveSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveSettings {
    /// Quiet period after the last edit before saving (default: 2 seconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AutosaveSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Consecutive failures before giving up until the next edit
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            backoff_factor: default_backoff_factor(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetrySettings {
    fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            bail!(
                "retry.backoff_factor must be a number of at least 1.0, got {}",
                self.backoff_factor
            );
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
            backoff_factor: self.backoff_factor,
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            docs_base_url: default_docs_base_url(),
            drive_base_url: default_drive_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address for `serve` to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_attempts() -> u32 {
    5
}

fn default_docs_base_url() -> String {
    docs_gateway::http::DOCS_API_BASE.to_string()
}

fn default_drive_base_url() -> String {
    docs_gateway::http::DRIVE_API_BASE.to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Settings {
    /// Load settings from the data directory, writing defaults if absent
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_file = data_dir.join(SETTINGS_FILE);

        if settings_file.exists() {
            let content = std::fs::read_to_string(&settings_file)
                .with_context(|| format!("Failed to read settings file: {:?}", settings_file))?;
            let settings: Settings = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", SETTINGS_FILE))?;
            settings.retry.validate()?;
            tracing::debug!("Loaded settings from {:?}", settings_file);
            Ok(settings)
        } else {
            let settings = Settings::default();

            std::fs::create_dir_all(data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

            let content = serde_json::to_string_pretty(&settings)?;
            std::fs::write(&settings_file, content)
                .with_context(|| format!("Failed to write default settings: {:?}", settings_file))?;
            tracing::info!("Created default settings at {:?}", settings_file);

            Ok(settings)
        }
    }
}

/// Resolve the data directory from an explicit value or the platform default
pub fn resolve_data_dir(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(path) if !path.trim().is_empty() => expand_tilde(path.trim()),
        _ => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daily-write"),
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}
