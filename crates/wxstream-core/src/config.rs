use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Temperature scale requested by a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Scale {
    #[default]
    C,
    F,
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::C => write!(f, "C"),
            Scale::F => write!(f, "F"),
        }
    }
}

/// Upstream weather provider. Serialized names match the option labels the
/// host settings UI sends in subscriber snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Provider {
    Yahoo,
    #[default]
    OpenWeatherMap,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Yahoo => write!(f, "Yahoo"),
            Provider::OpenWeatherMap => write!(f, "OpenWeatherMap"),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream provider endpoints and credential
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Refresh and retry behavior
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Profile substituted when a subscriber snapshot is incomplete
    #[serde(default)]
    pub defaults: DefaultSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Static OpenWeatherMap API key (can be set via WXSTREAM_API_KEY)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Yahoo YQL endpoint
    #[serde(default = "default_yahoo_url")]
    pub yahoo_url: String,

    /// OpenWeatherMap current-weather endpoint
    #[serde(default = "default_openweathermap_url")]
    pub openweathermap_url: String,

    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key() -> String {
    std::env::var("WXSTREAM_API_KEY").unwrap_or_default()
}

fn default_yahoo_url() -> String {
    "https://query.yahooapis.com/v1/public/yql".to_string()
}

fn default_openweathermap_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            yahoo_url: default_yahoo_url(),
            openweathermap_url: default_openweathermap_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Minutes a cached reading stays fresh
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u64,

    /// Maximum fetch attempts per trigger
    #[serde(default = "default_retry_bound")]
    pub retry_bound: u32,

    /// Concurrent subscriber refreshes during a scheduled tick
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_freshness_minutes() -> u64 {
    30
}

fn default_retry_bound() -> u32 {
    10
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            freshness_minutes: default_freshness_minutes(),
            retry_bound: default_retry_bound(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// City search term, e.g. "London, UK"
    #[serde(default = "default_city")]
    pub city: String,

    /// Temperature scale
    #[serde(default)]
    pub scale: Scale,

    /// Weather provider
    #[serde(default)]
    pub provider: Provider,
}

fn default_city() -> String {
    "London, UK".to_string()
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            city: default_city(),
            scale: Scale::default(),
            provider: Provider::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.provider.yahoo_url, "provider.yahoo_url", &mut result);
        self.validate_url(
            &self.provider.openweathermap_url,
            "provider.openweathermap_url",
            &mut result,
        );

        if self.provider.api_key.is_empty() {
            result.add_warning(
                "provider.api_key",
                "No API key configured - OpenWeatherMap requests will be rejected",
            );
        }

        if self.provider.timeout_secs == 0 {
            result.add_warning(
                "provider.timeout_secs",
                "Timeout disabled - upstream requests may hang indefinitely",
            );
        }

        if self.refresh.retry_bound == 0 {
            result.add_error(
                "refresh.retry_bound",
                "Retry bound must allow at least one fetch attempt",
            );
        }

        if self.refresh.freshness_minutes == 0 {
            result.add_warning(
                "refresh.freshness_minutes",
                "Freshness window disabled - every trigger will call upstream",
            );
        }

        if self.refresh.max_concurrent == 0 {
            result.add_error(
                "refresh.max_concurrent",
                "Concurrency cap must be greater than 0",
            );
        }

        if self.defaults.city.trim().is_empty() {
            result.add_error("defaults.city", "Default city must not be empty");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxstream");

        Ok(config_dir.join("config.toml"))
    }
}
