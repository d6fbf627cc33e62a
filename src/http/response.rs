//! Response sink written by encoders.
//!
//! # Responsibilities
//! - Hold status, headers and body until the handler returns
//! - Switch to a streaming body for event streams
//! - Convert into an axum [`Response`]
//!
//! # Design Decisions
//! - The first status written wins; later writes are logged and ignored
//! - Writing body bytes commits a 200 when no status was written
//! - Headers stay mutable until conversion, unlike a wire-level writer

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;

enum ResponseBody {
    Buffered(BytesMut),
    Streaming(Body),
}

/// Buffered (or streaming) response under construction.
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: ResponseBody,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: ResponseBody::Buffered(BytesMut::new()),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The committed status, or 200 if none was written yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether a status has been committed.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::warn!(
                    current = current.as_u16(),
                    ignored = status.as_u16(),
                    "superfluous status write"
                );
            }
            None => self.status = Some(status),
        }
    }

    /// Append body bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        match &mut self.body {
            ResponseBody::Buffered(buf) => buf.extend_from_slice(bytes),
            ResponseBody::Streaming(_) => {
                tracing::warn!(len = bytes.len(), "write to a streaming response dropped");
            }
        }
    }

    /// Buffered body written so far; empty for streaming responses.
    pub fn body(&self) -> &[u8] {
        match &self.body {
            ResponseBody::Buffered(buf) => buf,
            ResponseBody::Streaming(_) => &[],
        }
    }

    /// Replace the body with a stream.
    pub fn stream(&mut self, body: Body) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body = ResponseBody::Streaming(body);
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    /// Plain-text error reply: `msg` plus a newline, with `nosniff`.
    pub fn error(&mut self, status: StatusCode, msg: &str) {
        if let ResponseBody::Buffered(buf) = &mut self.body {
            if self.status.is_none() {
                buf.clear();
            }
        }
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.headers
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        self.write_status(status);
        self.write(msg.as_bytes());
        self.write(b"\n");
    }

    /// Commit a 204 with no body.
    pub fn no_content(&mut self) {
        self.write_status(StatusCode::NO_CONTENT);
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("streaming", &self.is_streaming())
            .field("buffered", &self.body().len())
            .finish()
    }
}

impl IntoResponse for ResponseWriter {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.body {
            ResponseBody::Buffered(buf) => Body::from(buf.freeze()),
            ResponseBody::Streaming(body) => body,
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}
