//! Application configuration management.
//!
//! Configuration is stored at `~/.config/schedulo/config.json` and may be
//! overridden by `SCHEDULO_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_PROFILE_URL};
use crate::auth::CredentialBackend;
use crate::models::DEFAULT_DATE_FORMAT;
use crate::view::RenderOptions;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "schedulo";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_CLIENT_ID: &str = "SCHEDULO_CLIENT_ID";
const ENV_PROFILE_URL: &str = "SCHEDULO_PROFILE_URL";
const ENV_API_URL: &str = "SCHEDULO_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client id registered with the identity provider
    pub client_id: Option<String>,
    pub profile_url: String,
    pub api_base_url: String,
    pub date_format: String,
    pub credential_backend: CredentialBackend,
    /// Where the rendered page is written
    pub output: Option<PathBuf>,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Enables a daily-rolling log file in this directory
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            credential_backend: CredentialBackend::default(),
            output: None,
            cache_dir: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(client_id) = lookup(ENV_CLIENT_ID).filter(|v| !v.is_empty()) {
            self.client_id = Some(client_id);
        }
        if let Some(url) = lookup(ENV_PROFILE_URL).filter(|v| !v.is_empty()) {
            self.profile_url = url;
        }
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            date_format: self.date_format.clone(),
        }
    }
}
