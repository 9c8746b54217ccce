//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&ProxyConfig → Result<(), Vec<ValidationError>>`

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

const MAX_REDIRECT_HOPS: usize = 50;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: {value} is out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{field}: unknown log level {value:?}")]
    InvalidLogLevel { field: &'static str, value: String },

    #[error("metrics address {0} collides with the listener")]
    AddressCollision(SocketAddr),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind = parse_addr("listener.bind_address", &config.listener.bind_address, &mut errors);

    let redirects = config.upstream.max_redirects;
    if !(1..=MAX_REDIRECT_HOPS).contains(&redirects) {
        errors.push(ValidationError::OutOfRange {
            field: "upstream.max_redirects",
            value: redirects as u64,
            min: 1,
            max: MAX_REDIRECT_HOPS as u64,
        });
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "upstream.connect_timeout_secs",
            value: 0,
            min: 1,
            max: u64::MAX,
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel {
            field: "observability.log_level",
            value: config.observability.log_level.clone(),
        });
    }

    if config.observability.metrics_enabled {
        let metrics = parse_addr(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
        if let (Some(bind), Some(metrics)) = (bind, metrics) {
            if collides(bind, metrics) {
                errors.push(ValidationError::AddressCollision(metrics));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Same port, and either the same IP or one side bound to all interfaces.
fn collides(a: SocketAddr, b: SocketAddr) -> bool {
    a.port() == b.port() && (a.ip() == b.ip() || a.ip().is_unspecified() || b.ip().is_unspecified())
}

fn parse_addr(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse() {
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
