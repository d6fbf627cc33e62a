//! Payload rendering and binding for axum services.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request ──▶ http::middleware ──▶ http::Bound<T> ──▶ decoders ──▶ walk::bind ──▶ handler
//!                (registry, limit,     (collect body)     (by Content-Type)  (bottom-up)
//!                 cancellation)
//!
//!   handler ──▶ walk::render ──▶ registry::respond ──▶ encoders ──▶ ResponseWriter ──▶ Response
//!               (top-down)        (Accept negotiation)  (JSON, XML, text, HTML)
//!
//!   handler ──▶ stream::EventStream ──▶ registry::respond_stream
//!                                         ├─ text/event-stream ──▶ stream::dispatcher task
//!                                         └─ otherwise ──▶ drained list ──▶ respond
//! ```
//!
//! Cross-cutting: `config` (TOML), `errors` (ErrResponse payloads),
//! `observability` (tracing, metrics), `lifecycle` (shutdown tokens).

// Core subsystems
pub mod negotiation;
pub mod registry;
pub mod walk;

// Codecs and streams
pub mod decoders;
pub mod encoders;
pub mod stream;

// axum glue
pub mod errors;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::RenderConfig;
pub use encoders::{Data, Html, Text};
pub use errors::{BoxError, ErrResponse};
pub use http::{Bound, RequestContext, ResponseWriter};
pub use lifecycle::Shutdown;
pub use negotiation::{ContentType, ContentTypeSet};
pub use registry::{Registry, RegistryBuilder};
pub use stream::EventStream;
pub use walk::{Binder, NilBinder, NilRender, Renderer};
