//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream score feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning comparative scores for every shift
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Response-key URL sent as `userResponseKeyUrl` in the request body
    #[serde(default)]
    pub response_key_url: String,

    /// Bearer token for the scores API; falls back to `SHIFT_ANALYTICS_BEARER_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Environment variable consulted when no bearer token is configured.
pub const BEARER_TOKEN_ENV: &str = "SHIFT_ANALYTICS_BEARER_TOKEN";

fn default_api_url() -> String {
    "https://api.jee-marks-calculator.mathongo.com/score".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("shift-analytics/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            response_key_url: String::new(),
            bearer_token: None,
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    /// The configured bearer token, or the one in [`BEARER_TOKEN_ENV`].
    pub fn bearer_token(&self) -> Option<String> {
        self.bearer_token
            .clone()
            .or_else(|| std::env::var(BEARER_TOKEN_ENV).ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Periodic refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Refresh interval (e.g. "15m", "900s")
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_interval() -> String {
    "15m".to_string()
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

impl RefreshConfig {
    /// Parsed interval, if the configured string is valid.
    pub fn interval(&self) -> Option<Duration> {
        parse_duration(&self.interval)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.source.api_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Source api_url is not a valid URL: {}",
                self.source.api_url
            )));
        }

        match self.refresh.interval() {
            Some(d) if !d.is_zero() => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Refresh interval must be a non-zero duration, got {:?}",
                    self.refresh.interval
                )));
            }
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.refresh.interval, "15m");
        assert_eq!(config.refresh.interval(), Some(Duration::from_secs(900)));
        assert_eq!(config.server.port, 8080);
        assert!(config.source.response_key_url.is_empty());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.source.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.source.api_url = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_interval() {
        let mut config = AppConfig::default();
        config.refresh.interval = "soon".to_string();
        assert!(config.validate().is_err());

        config.refresh.interval = "0s".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.source.api_url, parsed.source.api_url);
        assert_eq!(config.refresh.interval, parsed.refresh.interval);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[refresh]
interval = "30m"

[source]
response_key_url = "https://example.com/key.html"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh.interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.source.response_key_url, "https://example.com/key.html");
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_bearer_token_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
bearer_token = "  abc.def.ghi  "
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source.bearer_token(), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_blank_bearer_token_is_ignored() {
        let source = SourceConfig {
            bearer_token: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(source.bearer_token(), None);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = [").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
