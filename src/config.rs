use crate::{error::Result, RitmoError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential for the generative-language service. The assistant is
    /// unusable without it; cover lookup degrades to the fixed fallback set.
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Optional image-search credentials. When absent, cover lookup goes
    /// straight to the generative path.
    #[serde(default)]
    pub image_search_api_key: Option<String>,
    #[serde(default)]
    pub image_search_engine_id: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            gemini_base_url: default_gemini_base_url(),
            gemini_model: default_gemini_model(),
            image_search_api_key: None,
            image_search_engine_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| RitmoError::Config("Failed to get config directory".to_string()))?;

    path.push("ritmo");
    fs::create_dir_all(&path)?;

    path.push("config.json");
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        let default_config = Config::default();
        save_config(&default_config)?;
        return Ok(default_config);
    }

    let content = fs::read_to_string(&config_path)?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| RitmoError::Config(format!("Failed to parse config: {}", e)))?;
    let config: Config = serde_json::from_value(value.clone())
        .map_err(|e| RitmoError::Config(format!("Failed to parse config: {}", e)))?;

    // Backward compatibility: persist new fields if missing in old config files.
    let needs_backfill = value
        .as_object()
        .map(|obj| !obj.contains_key("gemini_model") || !obj.contains_key("request_timeout_secs"))
        .unwrap_or(false);
    if needs_backfill {
        save_config(&config)?;
    }

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_path()?;

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| RitmoError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.gemini_api_key.is_none());
        assert!(config.image_search_api_key.is_none());
    }

    #[test]
    fn test_default_round_trips() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gemini_base_url, config.gemini_base_url);
        assert_eq!(back.gemini_model, config.gemini_model);
    }
}
