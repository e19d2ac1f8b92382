use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::FileFormat;
use crate::store::{StoreDefaults, DEFAULT_LANGUAGE};
use crate::utils::normalize_base_url;

/// Base URL used when neither the config file nor the environment names one
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript service settings
    pub api: ApiConfig,

    /// Default export options
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the transcript service
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Language selected before discovery
    pub language: String,

    pub file_format: FileFormat,

    pub include_timestamps: bool,

    pub preserve_formatting: bool,

    /// Directory exported files are saved to (current directory if unset)
    pub output_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            file_format: FileFormat::Txt,
            include_timestamps: true,
            preserve_formatting: false,
            output_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults.
    ///
    /// `api_url` (from `--api-url` or the environment) overrides the file.
    pub fn load(api_url: Option<&str>) -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            serde_yaml::from_str::<Config>(&content).context("Failed to parse config file")?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Self::default()
        };

        if let Some(url) = api_url {
            config.api.base_url = url.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-downloader").join("config.yaml"))
    }

    /// Validate configuration and normalize the base URL
    fn validate(&mut self) -> Result<()> {
        self.api.base_url = normalize_base_url(&self.api.base_url)?;

        if self.api.timeout_secs == 0 {
            anyhow::bail!("API timeout must be at least one second");
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Initial values for the interaction state
    pub fn store_defaults(&self) -> StoreDefaults {
        StoreDefaults {
            language: self.defaults.language.clone(),
            file_format: self.defaults.file_format,
            include_timestamps: self.defaults.include_timestamps,
            preserve_formatting: self.defaults.preserve_formatting,
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API URL: {}", self.api.base_url);
        println!("  Timeout: {}s", self.api.timeout_secs);
        println!("  Default Language: {}", self.defaults.language);
        println!("  Default Format: {}", self.defaults.file_format);
        println!("  Include Timestamps: {}", self.defaults.include_timestamps);
        println!("  Preserve Formatting: {}", self.defaults.preserve_formatting);
        if let Some(dir) = &self.defaults.output_dir {
            println!("  Output Directory: {}", dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
api:
  base_url: "https://transcripts.example.com/"
defaults:
  language: th
  file_format: pdf
"#;
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.api.base_url, "https://transcripts.example.com");
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.defaults.language, "th");
        assert_eq!(config.defaults.file_format, FileFormat::Pdf);
        assert!(config.defaults.include_timestamps);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.api.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_defaults_follow_config() {
        let mut config = Config::default();
        config.defaults.language = "ja".to_string();
        config.defaults.file_format = FileFormat::Docx;

        let defaults = config.store_defaults();
        assert_eq!(defaults.language, "ja");
        assert_eq!(defaults.file_format, FileFormat::Docx);
    }
}
