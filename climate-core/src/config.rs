use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    normalize::{LabelZone, NormalizeOptions},
    provider::weatherbit::{
        DEFAULT_BASE_URL, DEFAULT_DAILY_DAYS, DEFAULT_HOURLY_HOURS, DEFAULT_LANG,
    },
};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "WEATHERBIT_API_KEY";

const MAX_HOURLY_HOURS: u32 = 24;
const MAX_DAILY_DAYS: u32 = 7;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// lang = "pt"
/// hourly_hours = 24
/// hourly_labels = "location"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the Weatherbit endpoint root, mostly useful for tests.
    pub base_url: Option<String>,

    /// Language for condition descriptions.
    pub lang: Option<String>,

    pub hourly_hours: Option<u32>,

    pub daily_days: Option<u32>,

    /// Whether hourly labels show UTC or the location's approximate local time.
    pub hourly_labels: Option<LabelZone>,

    /// Alternative city dataset; the bundled one is used when absent.
    pub cities_path: Option<PathBuf>,

    pub database_path: Option<PathBuf>,

    #[serde(skip)]
    api_key_override: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.api_key_override = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "climate", "climate")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where saved cities live unless `database_path` says otherwise.
    pub fn database_file_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("saved_cities.db")),
        }
    }

    /// Returns the API key, preferring the environment over the file.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key_override
            .as_deref()
            .or(self.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    pub fn hourly_hours(&self) -> u32 {
        self.hourly_hours.unwrap_or(DEFAULT_HOURLY_HOURS).clamp(1, MAX_HOURLY_HOURS)
    }

    pub fn daily_days(&self) -> u32 {
        self.daily_days.unwrap_or(DEFAULT_DAILY_DAYS).clamp(1, MAX_DAILY_DAYS)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            hourly_window: self.hourly_hours() as usize,
            label_zone: self.hourly_labels.unwrap_or_default(),
        }
    }
}
