use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://api.botspace.site/graphql";
pub const ENDPOINT_ENV: &str = "ASKR_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Q&A endpoint the prompts are posted to
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Dotted JSON paths tried in order to find the answer text
    pub answer_paths: Vec<String>,

    /// First message shown in a fresh conversation
    pub greeting: String,

    /// UI preferences
    pub ui: UiConfig,

    /// Askr home directory
    #[serde(skip)]
    pub askr_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_ms: u64,
    pub show_timestamps: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            show_timestamps: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
            answer_paths: vec![
                "data.ask".to_string(),
                "choices.0.message.content".to_string(),
            ],
            greeting: "Hello! I'm your AI assistant. How can I help you today?".to_string(),
            ui: UiConfig::default(),
            askr_home: home.join(".askr"),
        }
    }
}

impl Config {
    /// Load configuration from ~/.askr/config.toml and apply the environment override
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let askr_home = home.join(".askr");

        fs::create_dir_all(&askr_home).context("Failed to create .askr directory")?;

        let mut config = Self::load_from(&askr_home.join("config.toml"))?;
        config.askr_home = askr_home;

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            config.apply_endpoint_override(endpoint);
        }

        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.askr_home.join("config.toml");
        fs::create_dir_all(&self.askr_home).context("Failed to create .askr directory")?;
        let content = self.to_toml()?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Replace the endpoint unless the override is blank
    pub fn apply_endpoint_override(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        if !endpoint.trim().is_empty() {
            self.endpoint = endpoint.trim().to_string();
        }
    }

    /// Where the TUI writes its log file
    pub fn log_path(&self) -> PathBuf {
        self.askr_home.join("askr.log")
    }

    /// Host part of the endpoint, for the header bar
    pub fn endpoint_host(&self) -> &str {
        let rest = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        rest.split('/').next().unwrap_or(rest)
    }
}
