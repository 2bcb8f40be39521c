use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Host of the hosted documentation QA service
pub const DEFAULT_API_BASE_URL: &str = "https://khabiba17-deploy-chatbot.hf.space";

/// Path of the question endpoint, appended to the base URL
pub const ASK_PATH: &str = "/ask";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the question-answering service
    pub api_base_url: String,

    /// Client-side request timeout; `None` leaves the transport default
    pub request_timeout_secs: Option<u64>,

    /// UI preferences
    pub ui: UiConfig,

    /// docchat home directory
    #[serde(skip)]
    pub docchat_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub open_on_start: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            open_on_start: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            ui: UiConfig::default(),
            docchat_home: home.join(".docchat"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.docchat/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let docchat_home = home.join(".docchat");
        let config_path = docchat_home.join("config.toml");

        fs::create_dir_all(&docchat_home).context("Failed to create .docchat directory")?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            Self::from_toml_str(&content)?
        } else {
            Config::default()
        };

        config.docchat_home = docchat_home;
        Ok(config)
    }

    /// Parse a config document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.docchat_home).context("Failed to create .docchat directory")?;
        let config_path = self.docchat_home.join("config.toml");
        fs::write(&config_path, self.to_toml()?).context("Failed to write config file")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply command-line / environment overrides on top of the file values
    pub fn apply_overrides(&mut self, api_url: Option<String>, timeout_secs: Option<u64>) {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if timeout_secs.is_some() {
            self.request_timeout_secs = timeout_secs;
        }
    }

    /// Full URL of the ask endpoint
    pub fn ask_url(&self) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), ASK_PATH)
    }

    /// Directory the TUI writes its log file into
    pub fn log_dir(&self) -> PathBuf {
        self.docchat_home.join("logs")
    }
}
