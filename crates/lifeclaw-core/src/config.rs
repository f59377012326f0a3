//! LifeClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LifeClawError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifeClawConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl LifeClawConfig {
    /// Load config from the default path (~/.lifeclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LifeClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LifeClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LifeClawError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the LifeClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lifeclaw")
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. `~` is expanded by the binary.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "~/.lifeclaw/lifeclaw.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Sweep schedule configuration. Cron expressions are 5-field
/// ("MIN HOUR DOM MON DOW"); only minute/hour matching is honored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Daily full deadline sweep.
    #[serde(default = "default_deadline_cron")]
    pub deadline_cron: String,
    /// Hourly urgent-window sweep.
    #[serde(default = "default_urgent_cron")]
    pub urgent_cron: String,
    /// Daily recurrence-renewal sweep.
    #[serde(default = "default_renewal_cron")]
    pub renewal_cron: String,
    /// Seconds between scheduler ticks.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_deadline_cron() -> String {
    "0 9 * * *".into()
}
fn default_urgent_cron() -> String {
    "0 * * * *".into()
}
fn default_renewal_cron() -> String {
    "0 8 * * *".into()
}
fn default_check_interval() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deadline_cron: default_deadline_cron(),
            urgent_cron: default_urgent_cron(),
            renewal_cron: default_renewal_cron(),
            check_interval_secs: default_check_interval(),
        }
    }
}

/// Gateway HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    7600
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Push transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Request timeout for one delivery attempt.
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,
    /// Extra headers sent with every delivery (auth tokens etc).
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

fn default_push_timeout() -> u64 {
    10
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_push_timeout(),
            headers: Vec::new(),
        }
    }
}

/// Extraction oracle (OpenAI-compatible endpoint) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_extractor_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_extractor_model")]
    pub model: String,
    #[serde(default = "default_extractor_timeout")]
    pub timeout_secs: u64,
}

fn default_extractor_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_extractor_model() -> String {
    "gpt-4o-mini".into()
}
fn default_extractor_timeout() -> u64 {
    30
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_extractor_url(),
            api_key: String::new(),
            model: default_extractor_model(),
            timeout_secs: default_extractor_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LifeClawConfig::default();
        assert_eq!(config.scheduler.deadline_cron, "0 9 * * *");
        assert_eq!(config.scheduler.urgent_cron, "0 * * * *");
        assert_eq!(config.scheduler.renewal_cron, "0 8 * * *");
        assert_eq!(config.gateway.port, 7600);
        assert!(!config.extractor.enabled);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: LifeClawConfig = toml::from_str(
            "[scheduler]\nurgent_cron = \"30 * * * *\"\n\n[gateway]\nport = 9000\n",
        )
        .unwrap();
        assert_eq!(config.scheduler.urgent_cron, "30 * * * *");
        assert_eq!(config.scheduler.deadline_cron, "0 9 * * *");
        assert_eq!(config.gateway.port, 9000);
    }
}
