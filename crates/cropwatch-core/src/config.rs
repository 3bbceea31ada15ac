use crate::error::{CropwatchError, Result};
use crate::models::ZoomLevels;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_DEBOUNCE_MS: u64 = 350;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the Cropwatch client
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub api_base_url: ConfigValue<String>,
    pub geocode_endpoint: ConfigValue<String>,
    pub tile_url: ConfigValue<String>,
    pub debounce_ms: ConfigValue<u64>,
    pub min_query_chars: ConfigValue<usize>,
    pub suggestion_limit: ConfigValue<usize>,
    pub poll_interval_secs: ConfigValue<u64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: ConfigValue::new(DEFAULT_API_BASE_URL.to_string(), ConfigSource::Default),
            geocode_endpoint: ConfigValue::new(
                DEFAULT_GEOCODE_ENDPOINT.to_string(),
                ConfigSource::Default,
            ),
            tile_url: ConfigValue::new(DEFAULT_TILE_URL.to_string(), ConfigSource::Default),
            debounce_ms: ConfigValue::new(DEFAULT_DEBOUNCE_MS, ConfigSource::Default),
            min_query_chars: ConfigValue::new(DEFAULT_MIN_QUERY_CHARS, ConfigSource::Default),
            suggestion_limit: ConfigValue::new(DEFAULT_SUGGESTION_LIMIT, ConfigSource::Default),
            poll_interval_secs: ConfigValue::new(
                DEFAULT_POLL_INTERVAL_SECS,
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CropwatchError::ConfigFileNotFound { path: path.to_path_buf() });
        }

        let content = fs::read_to_string(path).map_err(|e| CropwatchError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| CropwatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.api_base_url {
            self.api_base_url.update(url, ConfigSource::File);
        }

        if let Some(endpoint) = file_config.geocode_endpoint {
            self.geocode_endpoint.update(endpoint, ConfigSource::File);
        }

        if let Some(tile_url) = file_config.tile_url {
            self.tile_url.update(tile_url, ConfigSource::File);
        }

        if let Some(ms) = file_config.debounce_ms {
            self.debounce_ms.update(ms, ConfigSource::File);
        }

        if let Some(chars) = file_config.min_query_chars {
            self.min_query_chars.update(chars, ConfigSource::File);
        }

        if let Some(limit) = file_config.suggestion_limit {
            self.suggestion_limit.update(parse_limit(limit)?, ConfigSource::File);
        }

        if let Some(secs) = file_config.poll_interval_secs {
            self.poll_interval_secs.update(parse_interval(secs)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // CROPWATCH_API_URL
        if let Ok(url) = env::var("CROPWATCH_API_URL") {
            self.api_base_url.update(url, ConfigSource::Environment);
        }

        // CROPWATCH_GEOCODE_URL
        if let Ok(endpoint) = env::var("CROPWATCH_GEOCODE_URL") {
            self.geocode_endpoint.update(endpoint, ConfigSource::Environment);
        }

        // CROPWATCH_TILE_URL
        if let Ok(tile_url) = env::var("CROPWATCH_TILE_URL") {
            self.tile_url.update(tile_url, ConfigSource::Environment);
        }

        // CROPWATCH_DEBOUNCE_MS
        if let Ok(ms_str) = env::var("CROPWATCH_DEBOUNCE_MS") {
            match ms_str.parse::<u64>() {
                Ok(ms) => self.debounce_ms.update(ms, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CROPWATCH_DEBOUNCE_MS value '{}': expected milliseconds",
                    ms_str
                ),
            }
        }

        // CROPWATCH_MIN_QUERY_CHARS
        if let Ok(chars_str) = env::var("CROPWATCH_MIN_QUERY_CHARS") {
            match chars_str.parse::<usize>() {
                Ok(chars) => self.min_query_chars.update(chars, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid CROPWATCH_MIN_QUERY_CHARS value '{}': expected integer",
                    chars_str
                ),
            }
        }

        // CROPWATCH_SUGGESTION_LIMIT
        if let Ok(limit_str) = env::var("CROPWATCH_SUGGESTION_LIMIT") {
            match limit_str.parse::<usize>() {
                Ok(limit) if limit > 0 => self.suggestion_limit.update(limit, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid CROPWATCH_SUGGESTION_LIMIT value '{}': expected positive integer",
                    limit_str
                ),
            }
        }

        // CROPWATCH_POLL_INTERVAL_SECS
        if let Ok(secs_str) = env::var("CROPWATCH_POLL_INTERVAL_SECS") {
            match secs_str.parse::<u64>() {
                Ok(secs) if secs > 0 => self.poll_interval_secs.update(secs, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid CROPWATCH_POLL_INTERVAL_SECS value '{}': expected positive seconds",
                    secs_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.api_base_url {
            self.api_base_url.update(url, ConfigSource::Cli);
        }

        if let Some(endpoint) = overrides.geocode_endpoint {
            self.geocode_endpoint.update(endpoint, ConfigSource::Cli);
        }

        if let Some(secs) = overrides.poll_interval_secs {
            self.poll_interval_secs.update(secs.max(1), ConfigSource::Cli);
        }
    }

    /// Settings for the debounced location search
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            debounce: Duration::from_millis(self.debounce_ms.value),
            min_query_chars: self.min_query_chars.value,
            suggestion_limit: self.suggestion_limit.value,
            zoom: ZoomLevels::default(),
        }
    }

    /// Settings for the job poller
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings { interval: Duration::from_secs(self.poll_interval_secs.value) }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "api_base_url".to_string(),
            (self.api_base_url.value.clone(), self.api_base_url.source),
        );

        map.insert(
            "geocode_endpoint".to_string(),
            (self.geocode_endpoint.value.clone(), self.geocode_endpoint.source),
        );

        map.insert("tile_url".to_string(), (self.tile_url.value.clone(), self.tile_url.source));

        map.insert(
            "debounce_ms".to_string(),
            (format!("{}ms", self.debounce_ms.value), self.debounce_ms.source),
        );

        map.insert(
            "min_query_chars".to_string(),
            (self.min_query_chars.value.to_string(), self.min_query_chars.source),
        );

        map.insert(
            "suggestion_limit".to_string(),
            (self.suggestion_limit.value.to_string(), self.suggestion_limit.source),
        );

        map.insert(
            "poll_interval_secs".to_string(),
            (format!("{}s", self.poll_interval_secs.value), self.poll_interval_secs.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    api_base_url: Option<String>,
    geocode_endpoint: Option<String>,
    tile_url: Option<String>,
    debounce_ms: Option<u64>,
    min_query_chars: Option<usize>,
    suggestion_limit: Option<usize>,
    poll_interval_secs: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub api_base_url: Option<String>,
    pub geocode_endpoint: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

/// Debounced location search settings
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke before suggestions are requested
    pub debounce: Duration,
    /// Trimmed queries shorter than this never reach the geocoder
    pub min_query_chars: usize,
    pub suggestion_limit: usize,
    pub zoom: ZoomLevels,
}

impl Default for SearchSettings {
    fn default() -> Self {
        LayeredConfig::with_defaults().search_settings()
    }
}

/// Job poller settings
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        LayeredConfig::with_defaults().poll_settings()
    }
}

fn parse_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(CropwatchError::ConfigInvalid {
            key: "suggestion_limit".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(limit)
}

fn parse_interval(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(CropwatchError::ConfigInvalid {
            key: "poll_interval_secs".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.api_base_url.value, "http://localhost:8000");
        assert_eq!(config.api_base_url.source, ConfigSource::Default);
        assert_eq!(config.debounce_ms.value, 350);
        assert_eq!(config.min_query_chars.value, 3);
        assert_eq!(config.poll_interval_secs.value, 3);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "https://crops.example.org"
debounce_ms = 500
poll_interval_secs = 5
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.api_base_url.value, "https://crops.example.org");
        assert_eq!(config.api_base_url.source, ConfigSource::File);
        assert_eq!(config.debounce_ms.value, 500);
        assert_eq!(config.poll_interval_secs.value, 5);
        assert_eq!(config.geocode_endpoint.source, ConfigSource::Default);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs = 0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(CropwatchError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/cropwatch.toml");
        assert!(matches!(result, Err(CropwatchError::ConfigFileNotFound { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            api_base_url: Some("http://10.0.0.5:8000".to_string()),
            ..Default::default()
        });

        assert_eq!(config.api_base_url.value, "http://10.0.0.5:8000");
        assert_eq!(config.api_base_url.source, ConfigSource::Cli);
        assert_eq!(config.geocode_endpoint.source, ConfigSource::Default);
    }

    #[test]
    fn test_derived_settings() {
        let config = LayeredConfig::with_defaults();
        let search = config.search_settings();
        assert_eq!(search.debounce, Duration::from_millis(350));
        assert_eq!(search.min_query_chars, 3);
        assert_eq!(config.poll_settings().interval, Duration::from_secs(3));
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("api_base_url"));
        assert!(map.contains_key("geocode_endpoint"));
        assert!(map.contains_key("poll_interval_secs"));

        let (debounce, source) = &map["debounce_ms"];
        assert_eq!(debounce, "350ms");
        assert_eq!(*source, ConfigSource::Default);
    }
}
