//! Configuration management for PCBook
//!
//! Defaults, TOML files and `PCBOOK_<SECTION>_<KEY>` environment variables,
//! validated before use.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

use crate::model::Role;

/// Largest image accepted by an upload, in bytes
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 1 << 20;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// How long in-flight calls may run after a shutdown signal
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Token signing and the initial user directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing secret
    pub secret_key: String,

    /// How long an issued token stays valid
    #[serde(with = "humantime_serde")]
    pub token_duration: Duration,

    /// Users created at startup
    pub seed_users: Vec<SeedUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Image persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Folder uploaded images are written to
    pub image_dir: PathBuf,

    /// Upload size limit in bytes
    pub max_image_size: usize,
}

/// Settings for the command-line client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_address: String,
    pub username: String,
    pub password: String,

    /// Re-login interval; must be shorter than `auth.token_duration`
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Deadline set on every catalog call through `grpc-timeout`
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions at startup
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "secret".to_string(),
            token_duration: Duration::from_secs(15 * 60),
            seed_users: vec![
                SeedUser {
                    username: "admin1".to_string(),
                    password: "secret".to_string(),
                    role: "admin".to_string(),
                },
                SeedUser {
                    username: "user1".to_string(),
                    password: "secret".to_string(),
                    role: "user".to_string(),
                },
            ],
        }
    }
}

impl AuthConfig {
    pub fn secret(&self) -> SecretString {
        SecretString::new(self.secret_key.clone())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("img"),
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: "http://127.0.0.1:8080".to_string(),
            username: "admin1".to_string(),
            password: "secret".to_string(),
            refresh_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime_serde::re::humantime::parse_duration(value)
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", key, e)))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: PCBOOK_<SECTION>_<KEY>
    /// Example: PCBOOK_SERVER_BIND_ADDRESS=0.0.0.0:8080
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay any `PCBOOK_*` environment variables onto `self`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server config
        if let Ok(addr) = env::var("PCBOOK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid bind address: {}", e)))?;
        }

        // Auth config
        if let Ok(secret) = env::var("PCBOOK_AUTH_SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Ok(duration) = env::var("PCBOOK_AUTH_TOKEN_DURATION") {
            self.auth.token_duration = parse_duration("token duration", &duration)?;
        }

        // Storage config
        if let Ok(dir) = env::var("PCBOOK_STORAGE_IMAGE_DIR") {
            self.storage.image_dir = PathBuf::from(dir);
        }
        if let Ok(size) = env::var("PCBOOK_STORAGE_MAX_IMAGE_SIZE") {
            self.storage.max_image_size = size
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid max image size: {}", e)))?;
        }

        // Client config
        if let Ok(address) = env::var("PCBOOK_CLIENT_SERVER_ADDRESS") {
            self.client.server_address = address;
        }
        if let Ok(username) = env::var("PCBOOK_CLIENT_USERNAME") {
            self.client.username = username;
        }
        if let Ok(password) = env::var("PCBOOK_CLIENT_PASSWORD") {
            self.client.password = password;
        }
        if let Ok(interval) = env::var("PCBOOK_CLIENT_REFRESH_INTERVAL") {
            self.client.refresh_interval = parse_duration("refresh interval", &interval)?;
        }

        // Logging config
        if let Ok(level) = env::var("PCBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("PCBOOK_LOG_JSON") {
            self.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        // Metrics config
        if let Ok(enabled) = env::var("PCBOOK_METRICS_ENABLED") {
            self.metrics.enabled = enabled
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid metrics flag: {}", e)))?;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret_key.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "secret_key must not be empty".to_string(),
            ));
        }

        if self.auth.token_duration.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "token_duration must be greater than 0".to_string(),
            ));
        }

        for user in &self.auth.seed_users {
            user.role.parse::<Role>().map_err(|e| {
                ConfigError::ValidationFailed(format!("seed user {}: {}", user.username, e))
            })?;
        }

        if self.storage.max_image_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_image_size must be greater than 0".to_string(),
            ));
        }

        // The cached client token must be replaced before it can expire.
        if self.client.refresh_interval.is_zero()
            || self.client.refresh_interval >= self.auth.token_duration
        {
            return Err(ConfigError::ValidationFailed(format!(
                "refresh_interval ({:?}) must be non-zero and shorter than token_duration ({:?})",
                self.client.refresh_interval, self.auth.token_duration
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.max_image_size, 1024 * 1024);
        assert_eq!(config.auth.token_duration, Duration::from_secs(900));
        assert_eq!(config.auth.seed_users.len(), 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.auth.secret_key.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.storage.max_image_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.auth.seed_users[0].role = "root".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_must_be_shorter_than_token_lifetime() {
        let mut config = Config::default();
        config.client.refresh_interval = config.auth.token_duration;
        assert!(config.validate().is_err());

        config.client.refresh_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config.client.refresh_interval = Duration::from_secs(60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pcbook.toml");

        let mut config = Config::default();
        config.auth.token_duration = Duration::from_secs(120);
        config.storage.image_dir = PathBuf::from("/tmp/images");
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.auth.token_duration, Duration::from_secs(120));
        assert_eq!(loaded.storage.image_dir, PathBuf::from("/tmp/images"));
        assert_eq!(loaded.auth.seed_users, config.auth.seed_users);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            secret_key = "another"
            token_duration = "10m"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.secret_key, "another");
        assert_eq!(config.auth.token_duration, Duration::from_secs(600));
        assert_eq!(config.auth.seed_users.len(), 2);
        assert_eq!(config.storage.max_image_size, DEFAULT_MAX_IMAGE_SIZE);
    }
}
