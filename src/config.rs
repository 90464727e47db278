use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeneralConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Only this many characters of the extracted text go into the prompt.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_id: default_model_id(),
            endpoint: default_endpoint(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_model_id() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_max_input_chars() -> usize {
    10_000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_iframe_timeout")]
    pub iframe_timeout_secs: u64,
    /// Render pages in headless Chrome before extracting.
    #[serde(default)]
    pub render: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            iframe_timeout_secs: default_iframe_timeout(),
            render: false,
        }
    }
}

fn default_iframe_timeout() -> u64 {
    3
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    60
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path();

        let content = fs::read_to_string(&config_path)
            .context(format!("Failed to read config.toml at {:?}", config_path))?;

        let mut config: Config = toml::from_str(&content).context("Failed to parse config.toml")?;
        config.apply_env();

        Ok(config)
    }

    /// Falls back to defaults when no config file exists yet.
    pub fn try_load() -> Result<Self> {
        if !get_config_path().exists() {
            log::info!("[Config] No config file found, using defaults");
            let mut config = Config::default();
            config.apply_env();
            return Ok(config);
        }
        Self::load()
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&config_path, content).context("Failed to write config.toml")?;

        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.model.api_key = key.trim().to_string();
            }
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        let dir = PathBuf::from(&self.general.data_dir);
        if dir.is_absolute() {
            dir
        } else {
            get_exe_dir().join(dir)
        }
    }
}

pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn get_config_path() -> PathBuf {
    let exe_dir = get_exe_dir();
    let config_path = exe_dir.join("config").join("config.toml");

    if config_path.exists() {
        return config_path;
    }

    let cwd_config = PathBuf::from("config/config.toml");
    if cwd_config.exists() {
        return cwd_config;
    }

    config_path
}

pub fn ensure_directories(config: &Config) -> Result<()> {
    let data_dir = config.data_dir();
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
    }

    let log_dir = data_dir.join("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model.max_input_chars, 10_000);
        assert_eq!(config.extraction.iframe_timeout_secs, 3);
        assert_eq!(config.general.data_dir, "data");
        assert!(!config.general.debug);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [model]
            api_key = "abc"
            model_id = "gemini-1.5-pro"

            [http]
            read_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.model.api_key, "abc");
        assert_eq!(config.model.model_id, "gemini-1.5-pro");
        assert_eq!(config.model.endpoint, default_endpoint());
        assert_eq!(config.http.read_timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.model.model_id, config.model.model_id);
        assert_eq!(back.extraction.render, config.extraction.render);
    }
}
