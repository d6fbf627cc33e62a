//! User-visible error payloads.
//!
//! # Data Flow
//! ```text
//! handler error / BindError / WalkError
//!     → ErrResponse (status, cause)
//!     → render hook (code, texts, status hint, advisory headers, log hook)
//!     → negotiated encoder writes the body
//! ```
//!
//! # Design Decisions
//! - Header prefix, code length and the default log hook are process-wide
//!   settings swapped atomically (settings.rs)
//! - An instance log hook overrides the process-wide one

pub mod response;
pub mod settings;

/// Error type returned by render and bind hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use response::ErrResponse;
pub use settings::{
    configure, generate_error_code, log_to_tracing, settings, ErrorLogFn, ErrorSettings, DEFAULT_CODE_LENGTH,
    DEFAULT_HEADER_PREFIX,
};
