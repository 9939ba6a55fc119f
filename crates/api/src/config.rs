use persistence::db::{DatabaseConfig, StoreBackend};
use serde::Deserialize;
use shared::aws::AwsCredentials;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub aws: AwsConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    pub queue: QueueConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Region, endpoint and credentials shared by every AWS client.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Overrides every service endpoint (e.g. LocalStack at `http://localhost:4566`).
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default)]
    pub session_token: Option<String>,
}

impl AwsConfig {
    pub fn credentials(&self) -> AwsCredentials {
        let credentials = AwsCredentials::new(&self.access_key_id, &self.secret_access_key);
        match &self.session_token {
            Some(token) if !token.is_empty() => credentials.with_session_token(token),
            _ => credentials,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectStoreConfig {
    /// Address buckets as `/<bucket>/<key>` instead of `<bucket>.` subdomains.
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub queue_url: String,

    /// Messages per receive call (1..=10).
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    /// Long-poll wait (0..=20 seconds).
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: u32,

    /// Messages of one batch processed concurrently.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Pause after a failed receive.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl QueueConfig {
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `dynamodb` or `memory`.
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default)]
    pub table_name: String,

    #[serde(default = "default_traffic_type_index")]
    pub traffic_type_index: String,
}

impl StoreConfig {
    pub fn backend(&self) -> Option<StoreBackend> {
        match self.backend.as_str() {
            "dynamodb" => Some(StoreBackend::DynamoDb),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_region() -> String {
    "eu-north-1".to_string()
}
fn default_max_messages() -> u32 {
    10
}
fn default_wait_time() -> u32 {
    20
}
fn default_max_in_flight() -> usize {
    4
}
fn default_error_backoff_ms() -> u64 {
    1000
}
fn default_store_backend() -> String {
    "dynamodb".to_string()
}
fn default_traffic_type_index() -> String {
    "GSI_TrafficType".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TS__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TS").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds from embedded defaults so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [logging]
            level = "info"
            format = "json"

            [aws]
            region = "eu-north-1"
            access_key_id = "test-access-key"
            secret_access_key = "test-secret-key"

            [object_store]
            force_path_style = false

            [queue]
            enabled = false
            queue_url = ""
            max_messages = 10
            wait_time_secs = 20
            max_in_flight = 4
            error_backoff_ms = 1000

            [store]
            backend = "memory"
            table_name = ""
            traffic_type_index = "GSI_TrafficType"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so partial configs load
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.store.table_name.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TS__STORE__TABLE_NAME environment variable must be set".to_string(),
            ));
        }

        if self.store.backend().is_none() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown store backend '{}' (expected dynamodb or memory)",
                self.store.backend
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.queue.enabled && self.queue.queue_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TS__QUEUE__QUEUE_URL must be set when the queue consumer is enabled".to_string(),
            ));
        }

        if !(1..=10).contains(&self.queue.max_messages) {
            return Err(ConfigValidationError::InvalidValue(
                "queue.max_messages must be between 1 and 10".to_string(),
            ));
        }

        if self.queue.wait_time_secs > 20 {
            return Err(ConfigValidationError::InvalidValue(
                "queue.wait_time_secs cannot exceed 20".to_string(),
            ));
        }

        if self.queue.max_in_flight == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "queue.max_in_flight must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Store settings in the shape the persistence layer expects.
    ///
    /// Call after `validate`; an unknown backend falls back to DynamoDB.
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            backend: self.store.backend().unwrap_or(StoreBackend::DynamoDb),
            traffic_type_index: self.store.traffic_type_index.clone(),
            region: self.aws.region.clone(),
            endpoint: self.aws.endpoint.clone(),
            credentials: self.aws.credentials(),
            request_timeout_secs: self.server.request_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: (&str, &str) = ("store.table_name", "message-templates");

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[TABLE]).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.store.traffic_type_index, "GSI_TrafficType");
        assert_eq!(config.store.backend(), Some(StoreBackend::Memory));
        assert!(!config.queue.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_env_override() {
        let config = Config::load_for_test(&[
            TABLE,
            ("server.port", "9000"),
            ("logging.level", "debug"),
            ("queue.max_in_flight", "8"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.queue.max_in_flight, 8);
    }

    #[test]
    fn test_config_validation_missing_table_name() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");
        let result = config.validate();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("TS__STORE__TABLE_NAME"));
    }

    #[test]
    fn test_config_validation_unknown_backend() {
        let config = Config::load_for_test(&[TABLE, ("store.backend", "postgres")])
            .expect("Failed to load config");
        let result = config.validate();

        assert!(result.unwrap_err().to_string().contains("postgres"));
    }

    #[test]
    fn test_config_validation_queue_without_url() {
        let config = Config::load_for_test(&[TABLE, ("queue.enabled", "true")])
            .expect("Failed to load config");

        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("TS__QUEUE__QUEUE_URL"));
    }

    #[test]
    fn test_config_validation_queue_limits() {
        for overrides in [
            [TABLE, ("queue.max_messages", "0")],
            [TABLE, ("queue.max_messages", "11")],
            [TABLE, ("queue.wait_time_secs", "21")],
            [TABLE, ("queue.max_in_flight", "0")],
        ] {
            let config = Config::load_for_test(&overrides).expect("Failed to load config");
            assert!(config.validate().is_err(), "accepted {:?}", overrides[1]);
        }
    }

    #[test]
    fn test_config_validation_port_zero() {
        let config = Config::load_for_test(&[TABLE, ("server.port", "0")])
            .expect("Failed to load config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[
            TABLE,
            ("server.host", "127.0.0.1"),
            ("server.port", "3000"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_credentials_ignore_empty_session_token() {
        let config = Config::load_for_test(&[TABLE, ("aws.session_token", "")])
            .expect("Failed to load config");
        assert!(config.aws.credentials().session_token.is_none());

        let config = Config::load_for_test(&[TABLE, ("aws.session_token", "token")])
            .expect("Failed to load config");
        assert_eq!(
            config.aws.credentials().session_token.as_deref(),
            Some("token")
        );
    }

    #[test]
    fn test_database_config() {
        let config = Config::load_for_test(&[TABLE, ("aws.endpoint", "http://localhost:4566")])
            .expect("Failed to load config");
        let database = config.database_config();

        assert_eq!(database.backend, StoreBackend::Memory);
        assert_eq!(database.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(database.traffic_type_index, "GSI_TrafficType");
    }
}
