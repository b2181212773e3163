//! Reader update configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Title of the synthetic bookmark tag unless configured otherwise
pub const DEFAULT_SAVED_FOR_LATER_TITLE: &str = "Saved Posts";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Remote API configuration
    pub api: ApiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Reader presentation settings
    pub reader: ReaderConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local config first, then the user config directory
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".readerupdate.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("readerupdate").join("readerupdate.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the OAuth access token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Number of recommended blogs to request
    #[serde(rename = "max-recommended")]
    pub max_recommended: u32,
}

impl ApiConfig {
    /// The access token, if the environment provides a non-empty one
    pub fn get_token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.trim().is_empty())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public-api.wordpress.com".to_string(),
            token_env: "READER_ACCESS_TOKEN".to_string(),
            timeout_ms: 30_000,
            max_recommended: 10,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("readerupdate")
                .join("reader.db"),
        }
    }
}

/// Reader presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Title of the local saved-for-later tag
    #[serde(rename = "saved-for-later-title")]
    pub saved_for_later_title: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            saved_for_later_title: DEFAULT_SAVED_FOR_LATER_TITLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://public-api.wordpress.com");
        assert_eq!(config.api.max_recommended, 10);
        assert_eq!(config.reader.saved_for_later_title, "Saved Posts");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
log-level: debug
api:
  base-url: http://localhost:8080
  timeout-ms: 500
reader:
  saved-for-later-title: Read Later
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_ms, 500);
        // Unspecified fields keep their defaults
        assert_eq!(config.api.token_env, "READER_ACCESS_TOKEN");
        assert_eq!(config.api.max_recommended, 10);
        assert_eq!(config.reader.saved_for_later_title, "Read Later");
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("readerupdate.yml");
        fs::write(&path, "storage:\n  db-path: /tmp/reader-test.db\nlog-level: WARN\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/reader-test.db"));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("WARN"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_token_from_unset_env_is_none() {
        let api = ApiConfig {
            token_env: "READERUPDATE_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(api.get_token().is_none());
    }
}
