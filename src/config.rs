use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};
use validator::{Validate, ValidationError};

use crate::services::cascade_reset::ResetMode;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_DATABASE_URL: &str = "sqlite://tradeflow.db?mode=rwc";
const DEFAULT_ADMIN_EMAIL: &str = "admin@tradeflow.local";

/// Database connection settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL (postgres:// or sqlite://)
    #[validate(length(min = 1))]
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1, max = 200))]
    pub max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Run the embedded migrator before every operation
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: default_db_max_connections(),
            min_connections: default_db_min_connections(),
            connect_timeout_secs: default_db_connect_timeout_secs(),
            acquire_timeout_secs: default_db_acquire_timeout_secs(),
            idle_timeout_secs: default_db_idle_timeout_secs(),
            auto_migrate: true,
        }
    }
}

/// Cascade reset behaviour
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResetConfig {
    /// Run the whole reset in one transaction (false: one transaction per kind)
    #[serde(default = "default_true_bool")]
    pub atomic: bool,

    /// Keep commodities on a full reset
    #[serde(default)]
    pub preserve_commodities: bool,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            atomic: true,
            preserve_commodities: false,
        }
    }
}

impl ResetConfig {
    pub fn mode(&self) -> ResetMode {
        if self.atomic {
            ResetMode::Atomic
        } else {
            ResetMode::Stepwise
        }
    }
}

/// Seed data settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    #[serde(default = "default_admin_email")]
    #[validate(email)]
    pub admin_email: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    #[validate]
    pub database: DatabaseConfig,

    #[serde(default)]
    #[validate]
    pub reset: ResetConfig,

    #[serde(default)]
    #[validate]
    pub seed: SeedConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENV.to_string(),
            log_level: default_log_level(),
            log_json: false,
            database: DatabaseConfig::default(),
            reset: ResetConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl AppConfig {
    /// Configuration pointing at the given database, defaults elsewhere
    pub fn for_database(url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.database.url = url.into();
        config
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_pool_bounds(&self) -> Result<(), validator::ValidationErrors> {
        let mut errors = validator::ValidationErrors::new();
        if self.database.min_connections > self.database.max_connections {
            let mut err = ValidationError::new("min_connections");
            err.message = Some("min_connections must not exceed max_connections".into());
            errors.add("database", err);
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    300
}
fn default_true_bool() -> bool {
    true
}
fn default_admin_email() -> String {
    DEFAULT_ADMIN_EMAIL.to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("tradeflow={},sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*, e.g. APP__DATABASE__URL)
///
/// A temporary console subscriber is installed while loading, so the
/// loader's own messages are printed before [`init_tracing`] runs.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("tradeflow={}", DEFAULT_LOG_LEVEL));
    load_config_logged_to(CONFIG_DIR, &filter, std::io::stdout)
}

pub fn load_config_from(config_dir: &str) -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(config_dir).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("database.url", DEFAULT_DATABASE_URL)?
        .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
        .add_source(File::with_name(&format!("{}/{}", config_dir, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_pool_bounds().map_err(|e| {
        error!("Database pool configuration is inconsistent: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

fn load_config_logged_to<W>(
    config_dir: &str,
    filter: &str,
    make_writer: W,
) -> Result<AppConfig, AppConfigError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || load_config_from(config_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn config_dir_with(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("default.toml"), content).unwrap();
        temp_dir
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_pool_bounds().is_ok());
        assert_eq!(cfg.reset.mode(), ResetMode::Atomic);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = AppConfig::default();
        cfg.log_level = "verbose".into();
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("log_level"));
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut cfg = AppConfig::for_database("sqlite::memory:");
        cfg.database.min_connections = 20;
        cfg.database.max_connections = 5;
        assert!(cfg.validate_pool_bounds().is_err());
    }

    #[test]
    fn stepwise_mode_from_config() {
        let cfg = ResetConfig {
            atomic: false,
            preserve_commodities: true,
        };
        assert_eq!(cfg.mode(), ResetMode::Stepwise);
    }

    #[test]
    fn loads_sections_from_file() {
        let dir = config_dir_with(
            r#"
            log_level = "debug"

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [reset]
            atomic = false
            preserve_commodities = true

            [seed]
            admin_email = "ops@example.com"
            "#,
        );

        let cfg = load_config_from(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.database_url(), "sqlite::memory:");
        assert_eq!(cfg.database.max_connections, 1);
        assert!(cfg.database.auto_migrate);
        assert!(!cfg.reset.atomic);
        assert!(cfg.reset.preserve_commodities);
        assert_eq!(cfg.seed.admin_email, "ops@example.com");
    }

    #[test]
    fn invalid_file_fails_validation() {
        let dir = config_dir_with(
            r#"
            log_level = "loud"

            [seed]
            admin_email = "not-an-email"
            "#,
        );

        let result = load_config_from(dir.path().to_str().unwrap());
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn loader_messages_reach_the_bootstrap_subscriber() {
        let dir = config_dir_with(
            r#"
            [database]
            url = "sqlite::memory:"
            "#,
        );
        let captured = Captured::default();
        let sink = captured.clone();

        let cfg = load_config_logged_to(dir.path().to_str().unwrap(), "tradeflow=info", move || {
            sink.clone()
        })
        .unwrap();

        assert_eq!(cfg.database_url(), "sqlite::memory:");
        let output = captured.text();
        assert!(output.contains("Loading configuration for environment"));
        assert!(output.contains("Configuration loaded successfully"));
    }

    #[test]
    fn validation_failure_is_logged_before_tracing_starts() {
        let dir = config_dir_with(r#"log_level = "loud""#);
        let captured = Captured::default();
        let sink = captured.clone();

        let result =
            load_config_logged_to(dir.path().to_str().unwrap(), "tradeflow=info", move || {
                sink.clone()
            });

        assert!(matches!(result, Err(AppConfigError::Validation(_))));
        assert!(captured.text().contains("Configuration validation failed"));
    }
}
