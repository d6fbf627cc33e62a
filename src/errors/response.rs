//! The [`ErrResponse`] payload.

use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::http::{RequestContext, ResponseWriter};
use crate::registry::BindError;
use crate::walk::{Binder, Renderer};

use super::settings::{generate_error_code, settings, ErrorLogFn};
use super::BoxError;

const STATUS_HEADER: &str = "error-status";
const CODE_HEADER: &str = "error-code";
const TEXT_HEADER: &str = "error-text";

/// An error rendered to the client like any other payload.
///
/// Texts left empty are derived when the payload is rendered: the status
/// text from the status code, the error text from the cause (else the status
/// text), the code from a random generator.
#[derive(Serialize)]
pub struct ErrResponse {
    #[serde(skip)]
    pub err: Option<BoxError>,

    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(rename = "status")]
    pub status_text: String,

    #[serde(rename = "code")]
    pub error_code: String,

    #[serde(rename = "error", skip_serializing_if = "String::is_empty")]
    pub error_text: String,

    #[serde(skip)]
    pub log_to: Option<ErrorLogFn>,
}

impl ErrResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            err: None,
            status_code,
            status_text: String::new(),
            error_code: String::new(),
            error_text: String::new(),
            log_to: None,
        }
    }

    pub fn with_error(status_code: StatusCode, err: impl Into<BoxError>) -> Self {
        Self {
            err: Some(err.into()),
            ..Self::new(status_code)
        }
    }

    pub fn bad_request(err: impl Into<BoxError>) -> Self {
        Self::with_error(StatusCode::BAD_REQUEST, err)
    }

    pub fn unsupported_media_type(err: impl Into<BoxError>) -> Self {
        Self::with_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, err)
    }

    pub fn unprocessable(err: impl Into<BoxError>) -> Self {
        Self::with_error(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn payload_too_large(err: impl Into<BoxError>) -> Self {
        Self::with_error(StatusCode::PAYLOAD_TOO_LARGE, err)
    }

    pub fn internal(err: impl Into<BoxError>) -> Self {
        Self::with_error(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = text.into();
        self
    }

    /// Per-instance log hook, overriding the process-wide one.
    pub fn log_to(mut self, hook: ErrorLogFn) -> Self {
        self.log_to = Some(hook);
        self
    }

    fn fill_in(&mut self, code_length: usize) {
        if self.error_code.is_empty() {
            self.error_code = generate_error_code(code_length);
        }
        if self.status_text.is_empty() {
            self.status_text = self
                .status_code
                .canonical_reason()
                .unwrap_or_default()
                .to_string();
        }
        if self.error_text.is_empty() {
            self.error_text = match &self.err {
                Some(err) => err.to_string(),
                None => self.status_text.clone(),
            };
        }
    }
}

impl Renderer for ErrResponse {
    fn render(&mut self, w: &mut ResponseWriter, r: &RequestContext) -> Result<(), BoxError> {
        let settings = settings();
        self.fill_in(settings.code_length);

        r.set_status(self.status_code);

        let headers = w.headers_mut();
        set_advisory(headers, &settings.header_prefix, STATUS_HEADER, &self.status_text);
        set_advisory(headers, &settings.header_prefix, CODE_HEADER, &self.error_code);
        set_advisory(headers, &settings.header_prefix, TEXT_HEADER, &self.error_text);

        if let Some(hook) = self.log_to.clone().or_else(|| settings.log_to.clone()) {
            hook(self);
        }
        Ok(())
    }
}

impl Binder for ErrResponse {}

fn set_advisory(headers: &mut HeaderMap, prefix: &str, suffix: &str, value: &str) {
    let name = match HeaderName::from_bytes(format!("{prefix}{suffix}").as_bytes()) {
        Ok(name) => name,
        Err(_) => {
            tracing::warn!(prefix, suffix, "invalid error header name");
            return;
        }
    };

    let clean: String = value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if let Ok(value) = HeaderValue::from_str(&clean) {
        headers.insert(name, value);
    }
}

impl From<BindError> for ErrResponse {
    fn from(err: BindError) -> Self {
        match &err {
            BindError::Decode(decode) if decode.is_unsupported() => Self::unsupported_media_type(err),
            BindError::Decode(_) => Self::bad_request(err),
            BindError::Walk(walk) => {
                let text = walk.cause().to_string();
                Self::unprocessable(err).error_text(text)
            }
        }
    }
}

impl fmt::Debug for ErrResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrResponse")
            .field("err", &self.err)
            .field("status_code", &self.status_code)
            .field("status_text", &self.status_text)
            .field("error_code", &self.error_code)
            .field("error_text", &self.error_text)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.err {
            Some(err) => write!(f, "{}: {}", self.status_code, err),
            None => write!(f, "{}", self.status_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext::from(&Request::builder().body(()).unwrap())
    }

    #[test]
    fn test_render_derives_fields() {
        let mut err = ErrResponse::new(StatusCode::NOT_FOUND);
        let mut w = ResponseWriter::new();
        let r = ctx();

        err.render(&mut w, &r).unwrap();

        assert_eq!(err.status_text, "Not Found");
        assert_eq!(err.error_text, "Not Found");
        assert_eq!(err.error_code.len(), 6);
        assert_eq!(r.status_hint(), Some(StatusCode::NOT_FOUND));
        assert!(w.body().is_empty());

        let prefix = settings().header_prefix.clone();
        assert_eq!(w.headers()[format!("{prefix}error-status").as_str()], "Not Found");
        assert_eq!(
            w.headers()[format!("{prefix}error-code").as_str()],
            err.error_code.as_str()
        );
    }

    #[test]
    fn test_error_text_from_cause() {
        let mut err = ErrResponse::bad_request("missing field `title`");
        err.render(&mut ResponseWriter::new(), &ctx()).unwrap();
        assert_eq!(err.status_text, "Bad Request");
        assert_eq!(err.error_text, "missing field `title`");
    }

    #[test]
    fn test_code_generated_once() {
        let mut err = ErrResponse::internal("db down");
        err.render(&mut ResponseWriter::new(), &ctx()).unwrap();
        let first = err.error_code.clone();
        err.render(&mut ResponseWriter::new(), &ctx()).unwrap();
        assert_eq!(err.error_code, first);
    }

    #[test]
    fn test_instance_log_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut err = ErrResponse::new(StatusCode::CONFLICT).log_to(Arc::new(move |e: &ErrResponse| {
            assert_eq!(e.status_text, "Conflict");
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        err.render(&mut ResponseWriter::new(), &ctx()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut err = ErrResponse::new(StatusCode::FORBIDDEN);
        err.status_text = "Forbidden".into();
        err.error_code = "123456".into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"status": "Forbidden", "code": "123456"}));
    }

    #[test]
    fn test_header_value_sanitized() {
        let mut err = ErrResponse::bad_request("line one\nline two");
        let mut w = ResponseWriter::new();
        err.render(&mut w, &ctx()).unwrap();
        let prefix = settings().header_prefix.clone();
        assert_eq!(
            w.headers()[format!("{prefix}error-text").as_str()],
            "line one line two"
        );
    }

    #[test]
    fn test_from_bind_error() {
        use crate::decoders::DecodeError;
        use crate::negotiation::ContentType;
        use crate::walk::WalkError;

        let err = ErrResponse::from(BindError::Decode(DecodeError::UnsupportedContentType(ContentType::new(
            "text/csv",
        ))));
        assert_eq!(err.status_code, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let err = ErrResponse::from(BindError::Decode(DecodeError::Xml("unexpected end".into())));
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);

        let err = ErrResponse::from(BindError::Walk(WalkError::Bind {
            node: "Greeting",
            source: "greeting is required".into(),
        }));
        assert_eq!(err.status_code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_text, "greeting is required");
    }
}
