use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const ENV_CONFIG_PATH: &str = "WORLDVIEW_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_BACKEND_URL: &str = "SUPABASE_URL";
const ENV_BACKEND_ANON_KEY: &str = "SUPABASE_ANON_KEY";

const DEFAULT_FETCH_LIMIT: u32 = 100;
const DEFAULT_COUNTER_LIST_LIMIT: u32 = 100;
const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the hosted datastore
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
}

impl BackendConfig {
    /// Read `SUPABASE_URL` and `SUPABASE_ANON_KEY`. Both are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(ENV_BACKEND_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_BACKEND_URL))?;
        let anon_key = std::env::var(ENV_BACKEND_ANON_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_BACKEND_ANON_KEY))?;

        Self::new(&url, &anon_key)
    }

    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(url.trim())
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", ENV_BACKEND_URL, e)))?;

        Ok(Self {
            url,
            anon_key: anon_key.trim().to_string(),
        })
    }
}

/// Settings for the aggregated list views
#[derive(Debug, Clone, Deserialize)]
pub struct ViewsConfig {
    /// How many worldviews the grouping views aggregate over
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountersConfig {
    #[serde(default = "default_counter_list_limit")]
    pub list_limit: u32,
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_COUNTER_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

fn default_fetch_limit() -> u32 {
    DEFAULT_FETCH_LIMIT
}

fn default_counter_list_limit() -> u32 {
    DEFAULT_COUNTER_LIST_LIMIT
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub views: ViewsConfig,
    #[serde(default)]
    pub counters: CountersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub views: ViewsConfig,
    pub counters: CountersConfig,
    pub refresh: RefreshConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            views: ViewsConfig::default(),
            counters: CountersConfig::default(),
            refresh: RefreshConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            views: file.views,
            counters: file.counters,
            refresh: file.refresh,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    pub fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "views:\n  fetch_limit: 250\n").unwrap();

        let config = Config::load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.views.fetch_limit, 250);
        assert_eq!(config.counters.list_limit, DEFAULT_COUNTER_LIST_LIMIT);
        assert_eq!(config.refresh.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_and_missing_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.views.fetch_limit, DEFAULT_FETCH_LIMIT);

        assert!(Config::load_config_file("/nonexistent/worldview.yaml").is_none());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "views: [not, a, map]").unwrap();
        assert!(Config::load_config_file(file.path().to_str().unwrap()).is_none());
    }

    #[test]
    fn test_backend_config_rejects_bad_url() {
        assert!(matches!(
            BackendConfig::new("not a url", "key"),
            Err(ConfigError::Invalid(_))
        ));
        let backend = BackendConfig::new("https://example.supabase.co", " key ").unwrap();
        assert_eq!(backend.anon_key, "key");
    }
}
