//! Process-wide error rendering settings.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use rand::Rng;

use crate::config::ErrorsConfig;

use super::ErrResponse;

/// Hook fired when an [`ErrResponse`] is rendered.
pub type ErrorLogFn = Arc<dyn Fn(&ErrResponse) + Send + Sync>;

pub const DEFAULT_HEADER_PREFIX: &str = "render-";
pub const DEFAULT_CODE_LENGTH: usize = 6;

#[derive(Clone)]
pub struct ErrorSettings {
    /// Prepended to `error-status`, `error-code` and `error-text`.
    pub header_prefix: String,
    /// Digits in a generated correlation code.
    pub code_length: usize,
    /// Default log hook, used when the instance has none.
    pub log_to: Option<ErrorLogFn>,
}

impl Default for ErrorSettings {
    fn default() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            log_to: None,
        }
    }
}

impl ErrorSettings {
    pub fn from_config(config: &ErrorsConfig) -> Self {
        let log_to: Option<ErrorLogFn> = if config.log_errors {
            Some(Arc::new(log_to_tracing))
        } else {
            None
        };

        Self {
            header_prefix: config.header_prefix.clone(),
            code_length: config.code_length,
            log_to,
        }
    }
}

impl std::fmt::Debug for ErrorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorSettings")
            .field("header_prefix", &self.header_prefix)
            .field("code_length", &self.code_length)
            .field("log_to", &self.log_to.is_some())
            .finish()
    }
}

static SETTINGS: OnceLock<ArcSwap<ErrorSettings>> = OnceLock::new();

fn cell() -> &'static ArcSwap<ErrorSettings> {
    SETTINGS.get_or_init(|| ArcSwap::from_pointee(ErrorSettings::default()))
}

/// Current settings snapshot.
pub fn settings() -> Arc<ErrorSettings> {
    cell().load_full()
}

/// Replace the process-wide settings.
pub fn configure(settings: ErrorSettings) {
    tracing::debug!(
        header_prefix = %settings.header_prefix,
        code_length = settings.code_length,
        log_errors = settings.log_to.is_some(),
        "error settings updated"
    );
    cell().store(Arc::new(settings));
}

/// Random decimal correlation code of `len` digits.
pub fn generate_error_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Log hook emitting one `error` event per rendered error.
pub fn log_to_tracing(err: &ErrResponse) {
    tracing::error!(
        status_code = err.status_code.as_u16(),
        status_text = %err.status_text,
        error_code = %err.error_code,
        error_text = %err.error_text,
        cause = ?err.err,
        "error response rendered"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_digits() {
        let code = generate_error_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert!(generate_error_code(0).is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = ErrorsConfig {
            header_prefix: "x-app-".to_string(),
            code_length: 8,
            log_errors: true,
        };
        let settings = ErrorSettings::from_config(&config);
        assert_eq!(settings.header_prefix, "x-app-");
        assert_eq!(settings.code_length, 8);
        assert!(settings.log_to.is_some());
    }

    #[test]
    fn test_defaults() {
        let settings = ErrorSettings::default();
        assert_eq!(settings.header_prefix, "render-");
        assert_eq!(settings.code_length, 6);
        assert!(settings.log_to.is_none());
    }
}
