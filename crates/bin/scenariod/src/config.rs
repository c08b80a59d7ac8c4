//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `scenariod.toml` in the working directory, or the file named by
//! `SCENARIO_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use scenario_app::dispatcher::DispatchConfig;

const DEFAULT_CONFIG_PATH: &str = "scenariod.toml";

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
    /// Outbound services called by actions.
    pub collaborators: CollaboratorsConfig,
    /// Action dispatch pool.
    pub dispatch: DispatchSettings,
    /// Event de-duplication.
    pub dedup: DedupConfig,
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

/// Base URLs and timeout of the services actions talk to.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CollaboratorsConfig {
    pub device_service_url: String,
    pub notification_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

/// Dispatch pool sizing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub max_concurrency: usize,
    pub queue_capacity: usize,
    /// Upper bound on one dispatch, in seconds. `0` means unbounded.
    pub max_duration_secs: u64,
    /// How long shutdown waits for running dispatches, in seconds.
    pub shutdown_grace_secs: u64,
}

/// Event de-duplication window.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Seconds an event id is remembered. `0` disables de-duplication.
    pub window_secs: u64,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SCENARIO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
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

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SCENARIO_HOST") {
            self.server.host = val;
        }
        for key in ["PORT", "SCENARIO_PORT"] {
            if let Some(port) = var(key).and_then(|val| val.parse().ok()) {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SCENARIO_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("SCENARIO_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("DEVICE_SERVICE_URL") {
            self.collaborators.device_service_url = val;
        }
        if let Some(val) = var("NOTIFICATION_SERVICE_URL") {
            self.collaborators.notification_url = val;
        }
        if let Some(val) = var("SCENARIO_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.collaborators.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "collaborators.timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.dispatch.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "dispatch.max_concurrency must be non-zero".to_string(),
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "dispatch.queue_capacity must be non-zero".to_string(),
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

    /// Settings of the outbound HTTP clients.
    #[must_use]
    pub fn http_clients(&self) -> scenario_adapter_http_reqwest::Config {
        scenario_adapter_http_reqwest::Config {
            device_service_url: self.collaborators.device_service_url.clone(),
            notification_url: self.collaborators.notification_url.clone(),
            timeout: Duration::from_secs(self.collaborators.timeout_secs),
        }
    }

    /// Settings of the dispatch pool.
    #[must_use]
    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            max_concurrency: self.dispatch.max_concurrency,
            queue_capacity: self.dispatch.queue_capacity,
            max_duration: (self.dispatch.max_duration_secs > 0)
                .then(|| Duration::from_secs(self.dispatch.max_duration_secs)),
        }
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.dispatch.shutdown_grace_secs)
    }

    #[must_use]
    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup.window_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:scenarios.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "scenariod=info,scenario=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            device_service_url: "http://device-service:8080".to_string(),
            notification_url: "http://notification-service:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        let pool = DispatchConfig::default();
        Self {
            max_concurrency: pool.max_concurrency,
            queue_capacity: pool.queue_capacity,
            max_duration_secs: 0,
            shutdown_grace_secs: 30,
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
    use std::collections::HashMap;

    fn with_vars(config: &mut Config, vars: &[(&str, &str)]) {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        config.apply_overrides(|key| vars.get(key).cloned());
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sqlite:scenarios.db?mode=rwc");
        assert_eq!(config.collaborators.timeout_secs, 10);
        assert_eq!(config.dispatch.max_concurrency, 64);
        assert_eq!(config.dispatch.queue_capacity, 1024);
        assert_eq!(config.dedup.window_secs, 0);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
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

            [collaborators]
            device_service_url = 'http://devices.local'
            notification_url = 'http://notify.local'
            timeout_secs = 3

            [dispatch]
            max_concurrency = 4
            queue_capacity = 16
            max_duration_secs = 120
            shutdown_grace_secs = 5

            [dedup]
            window_secs = 60
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.collaborators.device_service_url, "http://devices.local");
        assert_eq!(config.http_clients().timeout, Duration::from_secs(3));
        assert_eq!(
            config.dispatch(),
            DispatchConfig {
                max_concurrency: 4,
                queue_capacity: 16,
                max_duration: Some(Duration::from_secs(120)),
            }
        );
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.dedup_window(), Duration::from_secs(60));
    }

    #[test]
    fn should_treat_zero_max_duration_as_unbounded() {
        let config = Config::default();
        assert_eq!(config.dispatch().max_duration, None);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_collaborator_timeout() {
        let config: Config = toml::from_str("[collaborators]\ntimeout_secs = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(message)) if message.contains("timeout_secs")
        ));
    }

    #[test]
    fn should_reject_zero_concurrency_and_queue() {
        let mut config = Config::default();
        config.dispatch.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        with_vars(
            &mut config,
            &[
                ("PORT", "9000"),
                ("SCENARIO_DATABASE_URL", "sqlite::memory:"),
                ("DEVICE_SERVICE_URL", "http://devices.test"),
                ("NOTIFICATION_SERVICE_URL", "http://notify.test"),
                ("SCENARIO_LOG", "trace"),
            ],
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.collaborators.device_service_url, "http://devices.test");
        assert_eq!(config.collaborators.notification_url, "http://notify.test");
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_prefer_scenario_port_over_port() {
        let mut config = Config::default();
        with_vars(&mut config, &[("PORT", "9000"), ("SCENARIO_PORT", "9100")]);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn should_split_bind_override() {
        let mut config = Config::default();
        with_vars(&mut config, &[("SCENARIO_BIND", "127.0.0.1:7000")]);
        assert_eq!(config.bind_addr(), "127.0.0.1:7000");
    }

    #[test]
    fn should_ignore_unparseable_port() {
        let mut config = Config::default();
        with_vars(&mut config, &[("SCENARIO_PORT", "eighty")]);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn should_let_rust_log_win_over_scenario_log() {
        let mut config = Config::default();
        with_vars(&mut config, &[("SCENARIO_LOG", "warn"), ("RUST_LOG", "debug")]);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
