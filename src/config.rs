use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Application configuration, persisted as pretty JSON in the data
/// directory and created with defaults on first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_namespace")]
    pub storage_namespace: String,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_user_name() -> String {
    "User".to_string()
}

fn default_namespace() -> String {
    "gotchi_v1".to_string()
}

fn default_temperature() -> f32 {
    0.75
}

fn default_max_output_tokens() -> u32 {
    300
}

impl Config {
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("aigotchi")
        });

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str =
                std::fs::read_to_string(&config_path).context("Failed to read config.json")?;
            match serde_json::from_str::<Config>(&config_str) {
                Ok(mut config) => {
                    config.data_dir = data_dir;
                    config.apply_env_overrides();
                    return Ok(config);
                }
                Err(e) => {
                    eprintln!("Failed to parse config.json ({}), recreating defaults", e);
                }
            }
        }

        let mut config = Self::default_config(data_dir);
        config.apply_env_overrides();
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str).context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            user_name: default_user_name(),
            storage_namespace: default_namespace(),
            provider: ProviderConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                api_key: None,
                temperature: default_temperature(),
                max_output_tokens: default_max_output_tokens(),
            },
        }
    }

    fn apply_env_overrides(&mut self) {
        if self
            .provider
            .api_key
            .as_ref()
            .map_or(true, |key| key.is_empty())
        {
            self.provider.api_key = std::env::var("GEMINI_API_KEY").ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = Config::default_config(PathBuf::from("/tmp/test"));
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.user_name, "User");
        assert_eq!(restored.storage_namespace, "gotchi_v1");
        assert_eq!(restored.provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "provider": { "base_url": "http://localhost:9", "model": "m" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.user_name, "User");
        assert_eq!(config.provider.temperature, 0.75);
        assert_eq!(config.provider.max_output_tokens, 300);
    }
}
