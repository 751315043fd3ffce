//! Application configuration management.
//!
//! Configuration is stored at `~/.config/usercache/config.json`. Every field
//! is optional on disk; missing fields take their defaults. The environment
//! variables `USERCACHE_BASE_URL` and `USERCACHE_OFFLINE` override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::controller::DEFAULT_PAGE_SIZE;
use crate::repository::DEFAULT_LOOKUP_WINDOW;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "usercache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Host probed to decide whether we are online
const DEFAULT_PROBE_ADDR: &str = "dummyjson.com:443";

/// Connectivity probe timeout in milliseconds.
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1500;

const ENV_BASE_URL: &str = "USERCACHE_BASE_URL";
const ENV_OFFLINE: &str = "USERCACHE_OFFLINE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub page_size: u32,
    pub lookup_window: u32,
    pub offline_mode: bool,
    pub probe_addr: String,
    pub probe_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            lookup_window: DEFAULT_LOOKUP_WINDOW,
            offline_mode: false,
            probe_addr: DEFAULT_PROBE_ADDR.to_string(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.page_size = config.page_size.max(1);
        config.lookup_window = config.lookup_window.max(1);
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(flag) = var(ENV_OFFLINE) {
            self.offline_mode = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
