use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const BACKEND_URL_ENV: &str = "FULLTRACK_BACKEND_URL";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Initial state of the metadata-only toggle.
    #[serde(default)]
    pub allow_metadata_only: bool,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    pub base_url: Option<String>,
}

impl Config {
    /// Backend base URL: environment override, then config file, then the
    /// local development address.
    pub fn base_url(&self) -> String {
        pick_base_url(
            std::env::var(BACKEND_URL_ENV).ok(),
            self.backend.base_url.as_deref(),
        )
    }
}

fn pick_base_url(env: Option<String>, file: Option<&str>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .or_else(|| {
            file.map(str::to_string)
                .filter(|s| !s.trim().is_empty())
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("fulltrack")
        .join("config.toml")
}

pub fn load_config() -> Config {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable config {}: {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
