//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files and
//! every section has defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{DEFAULT_CODE_LENGTH, DEFAULT_HEADER_PREFIX};
use crate::http::DEFAULT_BODY_LIMIT;
use crate::registry::DEFAULT_FRAME_BUFFER;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    /// Content negotiation and the optional encoders.
    pub negotiation: NegotiationConfig,

    /// Error payload rendering.
    pub errors: ErrorsConfig,

    /// Request body limits.
    pub limits: LimitsConfig,

    /// Event stream settings.
    pub stream: StreamConfig,

    /// Demo server settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Assumed type of request bodies without `Content-Type` (empty: none).
    pub default_request: String,

    /// Type used when nothing acceptable can be produced.
    pub default_response: String,

    /// Serve streams as `text/event-stream` when accepted.
    pub event_stream: bool,

    /// Register the `text/html` encoder.
    pub html: bool,

    /// Register the `text/plain` encoder.
    pub plain_text: bool,

    /// Register the `application/octet-stream` encoder.
    pub octet_stream: bool,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            default_request: String::new(),
            default_response: "*/*".to_string(),
            event_stream: true,
            html: false,
            plain_text: false,
            octet_stream: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Prefix of the advisory error headers.
    pub header_prefix: String,

    /// Digits in a generated error code.
    pub code_length: usize,

    /// Log every rendered error through `tracing`.
    pub log_errors: bool,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            log_errors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body collected for binding.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Frames buffered per stream before the producer waits.
    pub frame_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Timeout for non-streaming requests in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
