//! Configuration loading from disk and the environment.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Service name override, as the original demo deployments set it.
pub const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// OTLP collector endpoint override.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Record store path override.
pub const ENV_DB_PATH: &str = "PULSEPAY_DB_PATH";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Apply environment overrides on top of whatever the file (or defaults)
/// provided. Environment wins; unset variables leave the config untouched.
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(name) = env::var(ENV_SERVICE_NAME) {
        config.observability.service_name = name;
    }
    if let Ok(endpoint) = env::var(ENV_OTLP_ENDPOINT) {
        config.observability.otlp_endpoint = endpoint;
    }
    if let Ok(path) = env::var(ENV_DB_PATH) {
        config.persistence.db_path = path;
    }
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let fail_rate = config.simulation.default_fail_rate;
    if !(0.0..=1.0).contains(&fail_rate) {
        return Err(ConfigError::Validation(format!(
            "simulation.default_fail_rate must be within [0, 1], got {fail_rate}"
        )));
    }
    if config.simulation.max_maintenance_mult == 0 {
        return Err(ConfigError::Validation(
            "simulation.max_maintenance_mult must be at least 1".to_string(),
        ));
    }
    if config.listener.bind_address.is_empty() {
        return Err(ConfigError::Validation(
            "listener.bind_address must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_complete_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [simulation]
            default_fail_rate = 0.5
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.simulation.default_fail_rate, 0.5);
    }

    #[test]
    fn rejects_out_of_range_fail_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [simulation]
            default_fail_rate = 1.5
            "#
        )
        .unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/pulsepay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
