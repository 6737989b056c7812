//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `brewhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use brewhub_adapter_brewfather::BrewfatherConfig;
use brewhub_adapter_mqtt::MqttConfig;
use brewhub_adapter_spark::SparkConfig;
use brewhub_app::mash_engine::EngineConfig;
use brewhub_domain::device::DeviceRef;
use brewhub_domain::settings::Settings;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Recipe service credentials.
    pub brewfather: BrewfatherConfig,
    /// Device controller REST API.
    pub spark: SparkConfig,
    /// Event bus connection.
    pub mqtt: MqttConfig,
    /// Mash engine settings.
    pub automation: AutomationConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// State store namespace of the `state` and `settings` records.
    pub namespace: String,
    pub setpoint_service_id: String,
    pub setpoint_block_id: String,
    pub device_timeout_secs: u64,
    /// How often the gateway readiness is polled.
    pub liveness_interval_secs: u64,
}

impl Config {
    /// Load configuration from `brewhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("brewhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BREWHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("BREWHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("BREWHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("BREWHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("BREWHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("BREWFATHER_USER_ID") {
            self.brewfather.user_id = val;
        }
        if let Ok(val) = std::env::var("BREWFATHER_TOKEN") {
            self.brewfather.api_key = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !self.brewfather.has_credentials() {
            return Err(ConfigError::Validation(
                "brewfather user_id and api_key are required".to_string(),
            ));
        }
        if self.automation.setpoint_block_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "automation.setpoint_block_id must not be empty".to_string(),
            ));
        }
        if self.automation.device_timeout_secs == 0 || self.automation.liveness_interval_secs == 0
        {
            return Err(ConfigError::Validation(
                "automation intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Engine configuration derived from the `[automation]` section.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let setpoint = DeviceRef::new(
            self.automation.setpoint_service_id.clone(),
            self.automation.setpoint_block_id.clone(),
        );
        EngineConfig {
            settings: Settings::new(setpoint),
            namespace: self.automation.namespace.clone(),
            device_timeout: Duration::from_secs(self.automation.device_timeout_secs),
        }
    }

    #[must_use]
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.automation.liveness_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:brewhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "brewhubd=info,brewhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            namespace: "brewhub".to_string(),
            setpoint_service_id: "spark-one".to_string(),
            setpoint_block_id: "HERMS MT Setpoint".to_string(),
            device_timeout_secs: 5,
            liveness_interval_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> Config {
        let mut config = Config::default();
        config.brewfather.user_id = "u1".to_string();
        config.brewfather.api_key = "secret".to_string();
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite:brewhub.db?mode=rwc");
        assert_eq!(config.automation.namespace, "brewhub");
        assert_eq!(config.automation.setpoint_block_id, "HERMS MT Setpoint");
        assert_eq!(config.mqtt.state_topic, "brewcast/state/brewhub");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.spark.service_id, "spark-one");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [brewfather]
            user_id = 'u1'
            api_key = 'secret'

            [spark]
            base_url = 'http://192.168.178.192'
            service_id = 'spark-two'

            [mqtt]
            broker_host = 'eventbus'

            [automation]
            namespace = 'cellar'
            setpoint_service_id = 'spark-two'
            setpoint_block_id = 'HLT Setpoint'
            device_timeout_secs = 3
            liveness_interval_secs = 30
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert!(config.brewfather.has_credentials());
        assert_eq!(config.spark.base_url, "http://192.168.178.192");
        assert_eq!(config.mqtt.broker_host, "eventbus");
        assert_eq!(config.automation.namespace, "cellar");
        assert_eq!(config.liveness_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = with_credentials();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_require_brewfather_credentials() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("brewfather"));
        assert!(with_credentials().validate().is_ok());
    }

    #[test]
    fn should_reject_zero_device_timeout() {
        let mut config = with_credentials();
        config.automation.device_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_derive_engine_config_from_automation_section() {
        let mut config = Config::default();
        config.automation.setpoint_service_id = "spark-two".to_string();
        config.automation.device_timeout_secs = 3;
        let engine = config.engine_config();
        assert_eq!(engine.settings.setpoint_device().service_id, "spark-two");
        assert_eq!(engine.settings.setpoint_device().id, "HERMS MT Setpoint");
        assert_eq!(engine.namespace, "brewhub");
        assert_eq!(engine.device_timeout, Duration::from_secs(3));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
