//! Live event streams.
//!
//! # Data Flow
//! ```text
//! EventStream (channel / Stream of items)
//!     → registry::respond_stream (negotiates text/event-stream)
//!     → dispatcher.rs (spawned task: render, serialize, frame)
//!     → mpsc::Sender<Bytes> → streaming response body → client
//! ```
//!
//! # Design Decisions
//! - One task per stream; the handler returns as soon as headers are set
//! - Each frame is its own body chunk, so hyper flushes it immediately
//! - Cancellation and client disconnect both end the stream without error

pub mod dispatcher;
pub mod frame;

use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderValue, Version};

use crate::encoders::{EncodeError, Encodable};
use crate::http::{RequestContext, ResponseWriter};

pub use dispatcher::{EventStream, StreamDispatcher, StreamOutcome};
pub use frame::Frame;

pub const CONTENT_TYPE_VALUE: &str = "text/event-stream; charset=utf-8";

/// Message of the frame sent when a stream is cancelled.
pub const TIMEOUT_MESSAGE: &str = "Server Timeout";

/// Event stream headers, `Connection` only below HTTP/2.
pub fn set_stream_headers(w: &mut ResponseWriter, version: Version) {
    let headers = w.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_VALUE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if version < Version::HTTP_2 {
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }
}

/// Registry entry for `text/event-stream`.
///
/// Marks the type as streamable; single values are never framed, so any
/// direct call yields to the next content type.
pub fn event_stream(
    _w: &mut ResponseWriter,
    _r: &RequestContext,
    _v: &dyn Encodable,
) -> Result<(), EncodeError> {
    Err(EncodeError::CannotEncode)
}
