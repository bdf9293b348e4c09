use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

pub const DEFAULT_FRESHNESS_SECS: u64 = 3;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a single provider (API key, optional endpoint override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Location of the weather history.
///
/// The store is a local SQLite file, so there are no PostgreSQL-style
/// connection parameters (host, port, user, password, database name).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite file holding the weather history. Defaults to the platform
    /// data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [providers.weatherstack]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Maximum age in seconds of a cached record before it is refreshed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
}

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk and layer environment overrides on top.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
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
        ProjectDirs::from("dev", "weather-service", "weather-service")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the weather database, configured or platform default.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("weather.db")),
        }
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        let secs = self.freshness_secs.unwrap_or(DEFAULT_FRESHNESS_SECS).min(u64::from(u32::MAX));
        chrono::Duration::seconds(secs as i64)
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }

    /// Set/replace a provider API key, keeping any endpoint override.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });
    }

    /// Override a provider's endpoint. Has no effect until an API key exists.
    pub fn set_provider_base_url(&mut self, provider_id: ProviderId, base_url: String) {
        if let Some(cfg) = self.providers.get_mut(provider_id.as_str()) {
            cfg.base_url = Some(base_url);
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("WEATHERSTACK_API_KEY") {
            self.upsert_provider_api_key(ProviderId::WeatherStack, key);
        }
        if let Some(key) = non_empty("OPENWEATHERMAP_API_KEY") {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }
        if let Some(url) = non_empty("WEATHERSTACK_BASE_URL") {
            self.set_provider_base_url(ProviderId::WeatherStack, url);
        }
        if let Some(url) = non_empty("OPENWEATHERMAP_BASE_URL") {
            self.set_provider_base_url(ProviderId::OpenWeather, url);
        }
        if let Some(path) = non_empty("WEATHER_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(secs) = non_empty("WEATHER_FRESHNESS_SECS") {
            let secs = secs
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid WEATHER_FRESHNESS_SECS value: {secs}"))?;
            self.freshness_secs = Some(secs);
        }

        Ok(())
    }
}
