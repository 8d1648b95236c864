use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(3);

/// Placeholder replaced by the postal code in the address API path template.
pub const POSTAL_CODE_PLACEHOLDER: &str = "{zip_code}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// ViaCEP-compatible address lookup API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressApiConfig {
    pub base_url: String,
    /// Path with a `{zip_code}` placeholder, e.g. `/ws/{zip_code}/json`.
    pub path_template: String,
}

impl Default for AddressApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://viacep.com.br".to_string(),
            path_template: format!("/ws/{POSTAL_CODE_PLACEHOLDER}/json"),
        }
    }
}

/// WeatherAPI.com-compatible current weather API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub path: String,
    pub api_key: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weatherapi.com".to_string(),
            path: "/v1/current.json".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Outbound request timeout in seconds; absent or zero means 3.
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Top-level configuration.
///
/// Built once at start-up and handed to the gateway constructors.
///
/// Example TOML:
/// ```toml
/// [server]
/// port = 8080
///
/// [weather_api]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub address_api: AddressApiConfig,
    pub weather_api: WeatherApiConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load defaults, then the config file, then `.env`, then the process environment.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;

        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("Failed to read .env file"),
        }

        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cep-weather", "cep-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override fields from environment-style variables supplied by `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("WEB_SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("WEB_SERVER_PORT is not a valid port: {port:?}"))?;
        }
        if let Some(url) = lookup("VIACEP_BASE_URL") {
            self.address_api.base_url = url;
        }
        if let Some(path) = lookup("VIACEP_PATH") {
            self.address_api.path_template = path;
        }
        if let Some(url) = lookup("WEATHER_BASE_URL") {
            self.weather_api.base_url = url;
        }
        if let Some(path) = lookup("WEATHER_PATH") {
            self.weather_api.path = path;
        }
        if let Some(key) = lookup("WEATHER_API_KEY") {
            self.weather_api.api_key = key;
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let secs = secs.trim().parse().with_context(|| {
                format!("HTTP_TIMEOUT_SECS is not a whole number of seconds: {secs:?}")
            })?;
            self.http.timeout_secs = Some(secs);
        }

        Ok(())
    }

    pub fn has_weather_api_key(&self) -> bool {
        !self.weather_api.api_key.trim().is_empty()
    }
}
