//! Stream dispatcher: turns an event source into SSE frames.
//!
//! # Responsibilities
//! - Pull items until the source ends, the request is cancelled or the
//!   client goes away
//! - Run render hooks per item, substituting hook errors into the frame
//! - Emit exactly one terminal frame (`EOF` or `error`) when it can
//!
//! # Design Decisions
//! - `biased` select: cancellation beats disconnect beats new items
//! - A blocked send still observes cancellation
//! - The cancellation frame waits up to [`TERMINAL_FRAME_WAIT`] for room in
//!   a full sink

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::encoders::Encodable;
use crate::http::{RequestContext, ResponseWriter};
use crate::observability::metrics;
use crate::walk::{self, RenderNode, Renderer};

use super::frame::Frame;
use super::TIMEOUT_MESSAGE;

/// How long a cancelled stream waits to enqueue its timeout frame.
pub const TERMINAL_FRAME_WAIT: Duration = Duration::from_secs(5);

/// A value pulled from an [`EventStream`].
pub(crate) trait StreamItem: Send {
    fn encodable(&self) -> &dyn Encodable;

    fn renderer(&mut self) -> Option<&mut dyn RenderNode>;
}

struct Plain<T>(T);

impl<T: Serialize + Send> StreamItem for Plain<T> {
    fn encodable(&self) -> &dyn Encodable {
        &self.0
    }

    fn renderer(&mut self) -> Option<&mut dyn RenderNode> {
        None
    }
}

struct Rendered<T>(T);

impl<T: Serialize + Renderer + Send> StreamItem for Rendered<T> {
    fn encodable(&self) -> &dyn Encodable {
        &self.0
    }

    fn renderer(&mut self) -> Option<&mut dyn RenderNode> {
        Some(&mut self.0)
    }
}

/// A source of live values served as `text/event-stream`.
pub struct EventStream {
    items: BoxStream<'static, Box<dyn StreamItem>>,
}

impl EventStream {
    /// Items are serialized as-is.
    pub fn new<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        Self {
            items: stream
                .map(|item| Box::new(Plain(item)) as Box<dyn StreamItem>)
                .boxed(),
        }
    }

    /// Each item's render hooks run before it is serialized.
    pub fn rendered<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize + Renderer + Send + 'static,
    {
        Self {
            items: stream
                .map(|item| Box::new(Rendered(item)) as Box<dyn StreamItem>)
                .boxed(),
        }
    }

    /// Stream the values sent on `rx` until every sender is dropped.
    pub fn channel<T>(rx: mpsc::Receiver<T>) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self::new(ReceiverStream::new(rx))
    }

    pub fn rendered_channel<T>(rx: mpsc::Receiver<T>) -> Self
    where
        T: Serialize + Renderer + Send + 'static,
    {
        Self::rendered(ReceiverStream::new(rx))
    }

    pub(crate) async fn next_item(&mut self) -> Option<Box<dyn StreamItem>> {
        self.items.next().await
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

/// Why a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The source ended and `EOF` was sent.
    Completed,
    /// The request was cancelled. The timeout frame was sent unless the
    /// sink stayed full for [`TERMINAL_FRAME_WAIT`].
    Cancelled,
    /// The client stopped reading.
    Disconnected,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::Cancelled => "cancelled",
            StreamOutcome::Disconnected => "disconnected",
        }
    }
}

enum SendFailure {
    Cancelled,
    Closed,
}

/// Drives one event stream for one request.
pub struct StreamDispatcher {
    ctx: RequestContext,
    frames: u64,
}

impl StreamDispatcher {
    pub fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            frames: 0,
        }
    }

    /// Forward `events` to `sink` as frames until a terminal condition.
    pub async fn run(mut self, mut events: EventStream, sink: mpsc::Sender<Bytes>) -> StreamOutcome {
        let cancel = self.ctx.cancellation().clone();

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break self.send_timeout_frame(&sink).await,

                _ = sink.closed() => break StreamOutcome::Disconnected,

                next = events.next_item() => {
                    let frame = match next {
                        Some(mut item) => self.frame_for(item.as_mut()),
                        None => Frame::Eof,
                    };
                    let last = frame == Frame::Eof;

                    match self.send(&sink, frame).await {
                        Ok(()) if last => break StreamOutcome::Completed,
                        Ok(()) | Err(SendFailure::Cancelled) => continue,
                        Err(SendFailure::Closed) => break StreamOutcome::Disconnected,
                    }
                }
            }
        };

        metrics::record_stream_end(outcome.as_str());
        tracing::info!(
            path = %self.ctx.uri().path(),
            outcome = outcome.as_str(),
            frames = self.frames,
            "event stream terminated"
        );
        outcome
    }

    /// Render and serialize one item.
    fn frame_for(&self, item: &mut dyn StreamItem) -> Frame {
        let rendered = match item.renderer() {
            Some(node) => {
                let mut scratch = ResponseWriter::new();
                walk::render(&mut scratch, &self.ctx, node).map(|_| ())
            }
            None => Ok(()),
        };

        let value = match rendered {
            Ok(()) => item.encodable().to_value(),
            Err(err) => {
                tracing::warn!(error = %err, "stream item render failed");
                Ok(json!({ "error": err.cause().to_string() }))
            }
        };

        match value.and_then(|v| serde_json::to_string(&v)) {
            Ok(text) => Frame::Data(text),
            Err(err) => {
                tracing::warn!(error = %err, "stream item serialization failed");
                Frame::Error(err.to_string())
            }
        }
    }

    async fn send_timeout_frame(&mut self, sink: &mpsc::Sender<Bytes>) -> StreamOutcome {
        let frame = Frame::Error(TIMEOUT_MESSAGE.to_string());
        match tokio::time::timeout(TERMINAL_FRAME_WAIT, sink.send(frame.encode())).await {
            Ok(Ok(())) => {
                self.count(&frame);
                StreamOutcome::Cancelled
            }
            Ok(Err(_)) => StreamOutcome::Disconnected,
            Err(_) => {
                tracing::debug!("sink still full, timeout frame dropped");
                StreamOutcome::Cancelled
            }
        }
    }

    async fn send(&mut self, sink: &mpsc::Sender<Bytes>, frame: Frame) -> Result<(), SendFailure> {
        let bytes = frame.encode();
        tokio::select! {
            biased;
            _ = self.ctx.cancellation().cancelled() => Err(SendFailure::Cancelled),
            sent = sink.send(bytes) => match sent {
                Ok(()) => {
                    self.count(&frame);
                    Ok(())
                }
                Err(_) => Err(SendFailure::Closed),
            },
        }
    }

    fn count(&mut self, frame: &Frame) {
        self.frames += 1;
        metrics::record_stream_frame(frame.kind());
    }
}
