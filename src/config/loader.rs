//! Configuration loading from the process environment.

use thiserror::Error;

use crate::config::schema::{ServiceConfig, DEFAULT_SERVICE_NAME};
use crate::config::validation::{validate_config, ValidationError};

/// Resource attributes, e.g. `service.name=atlan-api`.
pub const ENV_RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";
/// Collector endpoint for span export.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Standard OTel kill switch for the SDK.
pub const ENV_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the real process environment.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ServiceConfig::default();

    if let Some(attrs) = lookup(ENV_RESOURCE_ATTRIBUTES) {
        config.telemetry.service_name = parse_service_name(&attrs);
    }

    if let Some(endpoint) = lookup(ENV_OTLP_ENDPOINT) {
        let endpoint = endpoint.trim();
        if !endpoint.is_empty() {
            config.telemetry.otlp_endpoint = endpoint.to_string();
        }
    }

    if let Some(disabled) = lookup(ENV_SDK_DISABLED) {
        config.telemetry.export_disabled = disabled.trim().eq_ignore_ascii_case("true");
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Extract `service.name` from a `key=value[,key=value...]` attribute string.
///
/// Falls back to [`DEFAULT_SERVICE_NAME`] when the key is absent or empty.
pub fn parse_service_name(attributes: &str) -> String {
    attributes
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == "service.name")
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SERVICE_NAME)
        .to_string()
}
