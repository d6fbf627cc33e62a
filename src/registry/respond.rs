//! Response negotiation.
//!
//! # Data Flow
//! ```text
//! value ──► accepted types (override, else Accept) ──► encoder per type
//!              │ CannotEncode: next type              │ other error: 500
//!              └── exhausted ──► default_response encoder (must exist)
//!
//! stream ──► text/event-stream accepted? ──yes──► dispatcher task
//!              └── no ──► drain to list (504 on cancel) ──► value path
//! ```

use std::convert::Infallible;

use axum::body::Body;
use axum::http::StatusCode;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::encoders::Encodable;
use crate::http::{RequestContext, ResponseWriter};
use crate::negotiation::{accepted_content_types, ContentType, ContentTypeSet};
use crate::observability::metrics;
use crate::stream::dispatcher::StreamItem;
use crate::stream::{self, EventStream, StreamDispatcher, TIMEOUT_MESSAGE};
use crate::walk;

use super::Registry;

impl Registry {
    /// Negotiate a content type for `value` and encode it into `w`.
    ///
    /// # Panics
    ///
    /// When nothing negotiated fits and no encoder is registered for the
    /// default response type.
    pub fn respond(&self, w: &mut ResponseWriter, ctx: &RequestContext, value: &dyn Encodable) {
        let mut accepted = accepted_for(ctx);

        while accepted.advance() {
            let Some(ct) = accepted.current() else {
                break;
            };
            if *ct == ContentType::EVENT_STREAM {
                continue;
            }
            let Some(encode) = self.encoder(ct) else {
                continue;
            };

            match encode(w, ctx, value) {
                Ok(()) => {
                    tracing::debug!(content_type = %ct, "response negotiated");
                    metrics::record_negotiated(ct.as_str());
                    return;
                }
                Err(err) if err.is_cannot_encode() => {
                    tracing::debug!(content_type = %ct, value = value.type_name(), "encoder declined value");
                    metrics::record_encoder_fallback(ct.as_str());
                }
                Err(err) => {
                    tracing::warn!(content_type = %ct, error = %err, "encoder failed");
                    w.error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
                    return;
                }
            }
        }

        let (default, encode) = {
            let table = self.read_encoders();
            let encode = table.map.get(&table.default_response).cloned();
            (table.default_response.clone(), encode)
        };
        let Some(encode) = encode else {
            panic!("no encoder registered for default response content type '{default}'");
        };

        match encode(w, ctx, value) {
            Ok(()) => {
                tracing::debug!(content_type = %default, "default response type used");
                metrics::record_negotiated(default.as_str());
            }
            Err(err) => {
                tracing::warn!(content_type = %default, error = %err, "default encoder failed");
                w.error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
            }
        }
    }

    /// Serve `events` as `text/event-stream` when the client accepts it,
    /// else drain them into a list and respond with that.
    ///
    /// The streaming branch returns once headers are set; frames are written
    /// by a spawned task until the stream ends or the request is cancelled.
    pub async fn respond_stream(&self, w: &mut ResponseWriter, ctx: &RequestContext, mut events: EventStream) {
        let accepted = accepted_for(ctx);

        if accepted.has(&ContentType::EVENT_STREAM) && self.has_encoder(&ContentType::EVENT_STREAM) {
            stream::set_stream_headers(w, ctx.version());
            w.write_status(StatusCode::OK);

            let (sink, frames) = mpsc::channel(self.frame_buffer());
            w.stream(Body::from_stream(
                ReceiverStream::new(frames).map(Ok::<_, Infallible>),
            ));

            tracing::debug!(path = %ctx.uri().path(), "event stream started");
            metrics::record_negotiated(ContentType::EVENT_STREAM.as_str());
            tokio::spawn(StreamDispatcher::new(ctx.clone()).run(events, sink));
            return;
        }

        let cancel = ctx.cancellation().clone();
        let mut drained = Vec::new();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(path = %ctx.uri().path(), items = drained.len(), "drain cancelled");
                    w.error(StatusCode::GATEWAY_TIMEOUT, TIMEOUT_MESSAGE);
                    return;
                }

                next = events.next_item() => match next {
                    Some(mut item) => drained.push(drain_value(w, ctx, item.as_mut())),
                    None => break,
                },
            }
        }

        self.respond(w, ctx, &drained);
    }
}

fn accepted_for(ctx: &RequestContext) -> ContentTypeSet {
    match ctx.content_type_override() {
        Some(ct) => ContentTypeSet::new([ct.clone()]),
        None => accepted_content_types(ctx.headers()),
    }
}

/// One drained item; render and serialization errors are substituted.
fn drain_value(w: &mut ResponseWriter, ctx: &RequestContext, item: &mut dyn StreamItem) -> Value {
    if let Some(node) = item.renderer() {
        if let Err(err) = walk::render(w, ctx, node) {
            tracing::warn!(error = %err, "drained item render failed");
            return json!({ "error": err.cause().to_string() });
        }
    }
    item.encodable()
        .to_value()
        .unwrap_or_else(|err| json!({ "error": err.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::{self, EncodeError, Text};
    use crate::http::ContentTypeOverride;
    use axum::http::header::{ACCEPT, CONTENT_TYPE};
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;

    fn ctx(accept: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().uri("/things");
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        RequestContext::from(&builder.body(()).unwrap())
    }

    fn respond(registry: &Registry, ctx: &RequestContext, value: &dyn Encodable) -> ResponseWriter {
        let mut w = ResponseWriter::new();
        registry.respond(&mut w, ctx, value);
        w
    }

    fn body(w: &ResponseWriter) -> &str {
        std::str::from_utf8(w.body()).unwrap()
    }

    #[test]
    fn test_json_by_default() {
        let w = respond(&Registry::new(), &ctx(None), &serde_json::json!({"greeting": "hello"}));
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::json::CONTENT_TYPE);
        assert_eq!(body(&w), "{\"greeting\":\"hello\"}\n");
    }

    #[test]
    fn test_accept_xml() {
        let w = respond(&Registry::new(), &ctx(Some("application/xml")), &vec![1, 2]);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::xml::CONTENT_TYPE);
        assert!(body(&w).ends_with("<list><item>1</item><item>2</item></list>"));
    }

    #[test]
    fn test_quality_order_decides() {
        let w = respond(
            &Registry::new(),
            &ctx(Some("application/json;q=0.5, application/xml")),
            &7,
        );
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::xml::CONTENT_TYPE);
    }

    #[test]
    fn test_unknown_types_fall_back_to_default() {
        let w = respond(&Registry::new(), &ctx(Some("image/png, text/csv")), &7);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::json::CONTENT_TYPE);
        assert_eq!(body(&w), "7\n");
    }

    #[test]
    fn test_cannot_encode_yields_to_next_type() {
        let registry = Registry::new();
        registry
            .set_encoder(ContentType::PLAIN_TEXT, Some(encoders::encode_fn(encoders::plain_text)))
            .unwrap();

        let w = respond(&registry, &ctx(Some("text/plain, application/xml")), &42);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::xml::CONTENT_TYPE);
        assert!(body(&w).ends_with("<i32>42</i32>"));

        let w = respond(&registry, &ctx(Some("text/plain, application/xml")), &Text(42));
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::text::CONTENT_TYPE);
        assert_eq!(body(&w), "42");
    }

    #[test]
    fn test_encoder_failure_is_500() {
        let registry = Registry::new();
        registry
            .set_encoder(
                "application/broken",
                Some(encoders::encode_fn(|_, _, _| Err(EncodeError::Xml("boom".into())))),
            )
            .unwrap();

        let w = respond(&registry, &ctx(Some("application/broken")), &1);
        assert_eq!(w.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&w), "XML encode: boom\n");
    }

    #[test]
    fn test_override_replaces_accept() {
        let mut request = Request::builder()
            .header(ACCEPT, "application/json")
            .body(())
            .unwrap();
        request.extensions_mut().insert(ContentTypeOverride(ContentType::XML));
        let ctx = RequestContext::from(&request);

        let w = respond(&Registry::new(), &ctx, &1);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::xml::CONTENT_TYPE);
    }

    #[test]
    fn test_event_stream_skipped_for_values() {
        let w = respond(&Registry::new(), &ctx(Some("text/event-stream")), &1);
        assert_eq!(w.headers()[CONTENT_TYPE], encoders::json::CONTENT_TYPE);
    }

    #[test]
    #[should_panic(expected = "no encoder registered for default response")]
    fn test_missing_default_encoder_panics() {
        let registry = Registry::new();
        registry.set_encoder(ContentType::DEFAULT, None).unwrap();
        respond(&registry, &ctx(Some("text/csv")), &1);
    }

    #[tokio::test]
    async fn test_stream_drained_without_event_stream() {
        let registry = Registry::new();
        let events = EventStream::new(futures_util::stream::iter(vec![1, 2, 3]));

        let mut w = ResponseWriter::new();
        registry.respond_stream(&mut w, &ctx(Some("application/json")), events).await;

        assert!(!w.is_streaming());
        assert_eq!(body(&w), "[1,2,3]\n");
    }

    #[tokio::test]
    async fn test_drain_cancelled_is_504() {
        let registry = Registry::new();
        let token = CancellationToken::new();
        token.cancel();
        let (_tx, rx) = mpsc::channel::<u32>(1);

        let mut w = ResponseWriter::new();
        let ctx = ctx(None).with_cancellation(token);
        registry.respond_stream(&mut w, &ctx, EventStream::channel(rx)).await;

        assert_eq!(w.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body(&w), "Server Timeout\n");
    }

    #[tokio::test]
    async fn test_event_stream_accepted() {
        let registry = Registry::new();
        let events = EventStream::new(futures_util::stream::iter(vec!["a"]));

        let mut w = ResponseWriter::new();
        registry
            .respond_stream(&mut w, &ctx(Some("text/event-stream")), events)
            .await;

        assert!(w.is_streaming());
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.headers()[CONTENT_TYPE], stream::CONTENT_TYPE_VALUE);
    }
}
