//! Configuration validation.
//!
//! Returns every problem found, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid OTLP endpoint '{0}': expected an http(s) URL")]
    InvalidEndpoint(String),

    #[error("HTTP and metrics listeners share address {0}")]
    AddressConflict(String),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let api = check_address("bind", &config.bind_address, &mut errors);
    let metrics = check_address("metrics", &config.metrics_address, &mut errors);
    if let (Some(api), Some(metrics)) = (api, metrics) {
        if api == metrics && api.port() != 0 {
            errors.push(ValidationError::AddressConflict(api.to_string()));
        }
    }

    match Url::parse(&config.telemetry.otlp_endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        _ => errors.push(ValidationError::InvalidEndpoint(
            config.telemetry.otlp_endpoint.clone(),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse::<SocketAddr>() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
