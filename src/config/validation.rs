//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the node URL (absolute, http or https)
//! - Validate value ranges (timeouts, delays and windows > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before a client is built from the config

use reqwest::header::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node.base_url '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("node.user_agent is not a valid header value")]
    InvalidUserAgent,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(reason) = check_base_url(&config.node.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            url: config.node.base_url.clone(),
            reason,
        });
    }

    if HeaderValue::from_str(&config.node.user_agent).is_err() {
        errors.push(ValidationError::InvalidUserAgent);
    }

    let positive = [
        ("timeouts.request_ms", config.timeouts.request_ms),
        ("retries.backoff_base_ms", config.retries.backoff_base_ms),
        ("polling.interval_ms", config.polling.interval_ms),
        ("polling.max_wait_ms", config.polling.max_wait_ms),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
