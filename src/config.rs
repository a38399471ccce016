// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::models::AppConfig;

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("askblog");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the config file, writing out defaults on first run.
pub fn load_config() -> Result<AppConfig> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        let default_config = AppConfig::default();
        save_config(&default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(&config_path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = get_config_path()?;

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&config_path, contents).context("Failed to write config file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_config_creates_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();

        let original_home = std::env::var("HOME").ok();
        std::env::set_var("HOME", temp_dir.path());

        let config = load_config();

        if let Some(home) = &original_home {
            std::env::set_var("HOME", home);
        } else {
            std::env::remove_var("HOME");
        }

        assert!(
            config.is_ok(),
            "Config loading failed: {:?}. HOME was set to: {:?}",
            config.as_ref().err(),
            temp_dir.path()
        );
        let config = config.unwrap();
        assert_eq!(
            config.endpoint_url,
            "https://blog.data-v.site/api/semantic-search"
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join(".config/askblog");
        fs::create_dir_all(&config_dir).unwrap();

        let config = AppConfig {
            endpoint_url: "http://localhost:3000/api/search".to_string(),
            ..Default::default()
        };

        let config_path = config_dir.join("config.toml");
        let contents = toml::to_string(&config).unwrap();
        fs::write(&config_path, contents).unwrap();

        let loaded_contents = fs::read_to_string(&config_path).unwrap();
        let loaded_config: AppConfig = toml::from_str(&loaded_contents).unwrap();

        assert_eq!(
            loaded_config.endpoint_url,
            "http://localhost:3000/api/search"
        );
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config);
        assert!(serialized.is_ok());

        let deserialized: Result<AppConfig, _> = toml::from_str(&serialized.unwrap());
        assert!(deserialized.is_ok());
    }

    #[test]
    fn test_zero_timeout_roundtrips() {
        let config = AppConfig {
            request_timeout: 0,
            ..Default::default()
        };
        let serialized = toml::to_string(&config).unwrap();
        let loaded: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(loaded.request_timeout, 0);
    }
}
