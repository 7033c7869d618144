//! Configuration parsing and structures

use std::path::PathBuf;

use serde::Deserialize;

use crate::env::substitute_env_vars;
use crate::plugin::DEFAULT_CHUNK_SIZE;

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw configuration as deserialized from YAML.
/// This is converted to `Config` via `resolve()`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API bridge configuration
    #[serde(default)]
    pub server: RawServerConfig,

    /// Upper bound on read stream chunk sizes, in bytes
    pub chunk_size: Option<usize>,
}

/// Server section before resolution - all fields optional
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Bind address (loopback expected)
    pub host: Option<String>,

    /// Bind port; 0 selects an ephemeral port
    pub port: Option<u16>,
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// Top-level configuration (resolved from RawConfig)
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// API bridge configuration
    pub server: ServerConfig,

    /// Upper bound on read stream chunk sizes, in bytes
    pub chunk_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// API bridge configuration (resolved)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port; 0 selects an ephemeral port
    pub port: u16,
}

// =============================================================================
// Resolution Logic
// =============================================================================

impl RawConfig {
    /// Resolve raw config into final config by filling in defaults
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let RawConfig {
            logging,
            server,
            chunk_size,
        } = self;

        Ok(Config {
            logging,
            server: ServerConfig {
                host: server.host.unwrap_or_else(|| "127.0.0.1".to_string()),
                port: server.port.unwrap_or(0),
            },
            chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        })
    }
}

impl Config {
    /// Load configuration from a YAML file, substituting `${VAR}` references
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e.to_string()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let content = substitute_env_vars(content)?;
        let raw: RawConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "server.host is not a valid IP address: {}",
                self.server.host
            )));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
logging:
  level: debug

server:
  host: 127.0.0.1
  port: 8443

chunk_size: 4096
"#;

        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8443);
        assert_eq!(config.chunk_size, 4096);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_fill_in() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 0);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = Config::parse("chunk_size: 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_host_rejected() {
        let yaml = r#"
server:
  host: not-an-address
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let yaml = r#"
logging:
  level: verbose
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_substitution_in_config() {
        std::env::set_var("FUSE_FS_TEST_PORT", "9120");
        let config = Config::parse("server:\n  port: ${FUSE_FS_TEST_PORT}\n").unwrap();
        assert_eq!(config.server.port, 9120);
        std::env::remove_var("FUSE_FS_TEST_PORT");
    }
}
