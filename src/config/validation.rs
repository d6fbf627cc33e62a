//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check content type shapes and the advisory header prefix
//! - Validate value ranges (limits > 0, code length bounded)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RenderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::RenderConfig;

/// Longest accepted error code.
pub const MAX_CODE_LENGTH: usize = 32;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("negotiation.default_response must not be empty")]
    EmptyDefaultResponse,

    #[error("{field}: '{value}' is not a type/subtype content type")]
    MalformedContentType { field: &'static str, value: String },

    #[error("errors.header_prefix '{0}' does not form valid header names")]
    InvalidHeaderPrefix(String),

    #[error("errors.code_length must be between 1 and {MAX_CODE_LENGTH}, got {0}")]
    InvalidCodeLength(usize),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("stream.frame_buffer must be greater than zero")]
    ZeroFrameBuffer,

    #[error("server.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &RenderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let negotiation = &config.negotiation;
    if negotiation.default_response.is_empty() {
        errors.push(ValidationError::EmptyDefaultResponse);
    } else if !is_media_type(&negotiation.default_response) {
        errors.push(ValidationError::MalformedContentType {
            field: "negotiation.default_response",
            value: negotiation.default_response.clone(),
        });
    }
    if !negotiation.default_request.is_empty() && !is_media_type(&negotiation.default_request) {
        errors.push(ValidationError::MalformedContentType {
            field: "negotiation.default_request",
            value: negotiation.default_request.clone(),
        });
    }

    let prefix = &config.errors.header_prefix;
    if HeaderName::from_bytes(format!("{prefix}error-status").as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderPrefix(prefix.clone()));
    }
    if !(1..=MAX_CODE_LENGTH).contains(&config.errors.code_length) {
        errors.push(ValidationError::InvalidCodeLength(config.errors.code_length));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.stream.frame_buffer == 0 {
        errors.push(ValidationError::ZeroFrameBuffer);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_media_type(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty() && !subtype.is_empty() && !value.contains(|c: char| c.is_whitespace() || c == ';')
        }
        None => false,
    }
}
