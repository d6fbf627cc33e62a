//! Encoder and decoder tables.
//!
//! # Responsibilities
//! - Map content types to encoders and decoders
//! - Hold the default request and response content types
//! - Decode and bind request payloads, render response payloads
//!
//! # Design Decisions
//! - Encoders and decoders live behind independent locks; each default lives
//!   in the lock domain of its table
//! - Codec functions are cloned out of the table and invoked without a lock
//! - Readers recover from a poisoned lock; writers report it
//! - The default response type is validated whenever it is set

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::NegotiationConfig;
use crate::decoders::{self, DecodeError, DecodeFn};
use crate::encoders::{self, EncodeFn, Encodable};
use crate::errors::ErrResponse;
use crate::http::{RequestContext, ResponseWriter};
use crate::negotiation::{request_content_type, ContentType, ContentTypeSet};
use crate::observability::metrics;
use crate::stream::{self, EventStream};
use crate::walk::{self, BindNode, RenderNode, WalkError};

/// Default capacity of the per-stream frame channel.
pub const DEFAULT_FRAME_BUFFER: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry lock poisoned")]
    Unusable,

    #[error("default response content type must not be empty")]
    EmptyDefault,

    #[error("no encoder registered for default response content type '{0}'")]
    MissingDefaultEncoder(ContentType),

    #[error("process-wide registry already installed")]
    AlreadyInstalled,
}

/// Decoding or a bind hook failed.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}

#[derive(Clone)]
pub(crate) struct EncoderTable {
    pub(crate) map: HashMap<ContentType, EncodeFn>,
    pub(crate) default_response: ContentType,
}

#[derive(Clone)]
struct DecoderTable {
    map: HashMap<ContentType, DecodeFn>,
    default_request: ContentType,
}

/// Content type to codec mappings shared by every request.
pub struct Registry {
    encoders: RwLock<EncoderTable>,
    decoders: RwLock<DecoderTable>,
    frame_buffer: usize,
}

impl Registry {
    /// Built-in encoders (`*/*` and JSON, XML, event stream) and decoders
    /// (JSON, XML, form).
    pub fn new() -> Self {
        Self::from_tables(builtin_encoders(), builtin_decoders(), DEFAULT_FRAME_BUFFER)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn from_config(config: &NegotiationConfig) -> Result<Self, RegistryError> {
        RegistryBuilder::from_config(config).build()
    }

    /// A deep copy of the process-wide registry.
    pub fn clone_default() -> Self {
        super::global().as_ref().clone()
    }

    fn from_tables(encoders: EncoderTable, decoders: DecoderTable, frame_buffer: usize) -> Self {
        Self {
            encoders: RwLock::new(encoders),
            decoders: RwLock::new(decoders),
            frame_buffer,
        }
    }

    pub(crate) fn read_encoders(&self) -> RwLockReadGuard<'_, EncoderTable> {
        self.encoders.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_decoders(&self) -> RwLockReadGuard<'_, DecoderTable> {
        self.decoders.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_encoders(&self) -> Result<RwLockWriteGuard<'_, EncoderTable>, RegistryError> {
        self.encoders.write().map_err(|_| RegistryError::Unusable)
    }

    fn write_decoders(&self) -> Result<RwLockWriteGuard<'_, DecoderTable>, RegistryError> {
        self.decoders.write().map_err(|_| RegistryError::Unusable)
    }

    /// Register `encoder` for `ct`, or remove the entry with `None`.
    pub fn set_encoder(&self, ct: impl Into<ContentType>, encoder: Option<EncodeFn>) -> Result<(), RegistryError> {
        let ct = ct.into();
        let mut table = self.write_encoders()?;
        match encoder {
            Some(encoder) => {
                tracing::debug!(content_type = %ct, "encoder registered");
                table.map.insert(ct, encoder);
            }
            None => {
                tracing::debug!(content_type = %ct, "encoder removed");
                table.map.remove(&ct);
            }
        }
        Ok(())
    }

    /// Register `decoder` for `ct`, or remove the entry with `None`.
    pub fn set_decoder(&self, ct: impl Into<ContentType>, decoder: Option<DecodeFn>) -> Result<(), RegistryError> {
        let ct = ct.into();
        let mut table = self.write_decoders()?;
        match decoder {
            Some(decoder) => {
                tracing::debug!(content_type = %ct, "decoder registered");
                table.map.insert(ct, decoder);
            }
            None => {
                tracing::debug!(content_type = %ct, "decoder removed");
                table.map.remove(&ct);
            }
        }
        Ok(())
    }

    /// Content types with an encoder, sorted.
    pub fn supported_encoders(&self) -> ContentTypeSet {
        let mut types: Vec<ContentType> = self.read_encoders().map.keys().cloned().collect();
        types.sort();
        ContentTypeSet::new(types)
    }

    /// Content types with a decoder, sorted.
    pub fn supported_decoders(&self) -> ContentTypeSet {
        let mut types: Vec<ContentType> = self.read_decoders().map.keys().cloned().collect();
        types.sort();
        ContentTypeSet::new(types)
    }

    pub fn encoder(&self, ct: &ContentType) -> Option<EncodeFn> {
        self.read_encoders().map.get(ct).cloned()
    }

    pub fn decoder(&self, ct: &ContentType) -> Option<DecodeFn> {
        self.read_decoders().map.get(ct).cloned()
    }

    pub fn has_encoder(&self, ct: &ContentType) -> bool {
        self.read_encoders().map.contains_key(ct)
    }

    /// Assumed type of bodies without a usable `Content-Type`.
    pub fn default_request(&self) -> ContentType {
        self.read_decoders().default_request.clone()
    }

    pub fn set_default_request(&self, ct: impl Into<ContentType>) -> Result<(), RegistryError> {
        self.write_decoders()?.default_request = ct.into();
        Ok(())
    }

    /// Type used when nothing the client accepts can be produced.
    pub fn default_response(&self) -> ContentType {
        self.read_encoders().default_response.clone()
    }

    /// Refuses an empty type and a type without an encoder.
    pub fn set_default_response(&self, ct: impl Into<ContentType>) -> Result<(), RegistryError> {
        let ct = ct.into();
        let mut table = self.write_encoders()?;
        validate_default(&table, &ct)?;
        table.default_response = ct;
        Ok(())
    }

    /// Capacity of the frame channel of each event stream.
    pub fn frame_buffer(&self) -> usize {
        self.frame_buffer
    }

    /// Decode `body` by the request's content type into `T`.
    pub fn decode<T: DeserializeOwned>(&self, ctx: &RequestContext, body: &[u8]) -> Result<T, DecodeError> {
        let (ct, decoder) = {
            let table = self.read_decoders();
            let ct = request_content_type(ctx.headers(), &table.default_request);
            let decoder = table.map.get(&ct).cloned();
            (ct, decoder)
        };

        let Some(decoder) = decoder else {
            metrics::record_decode(ct.as_str(), "unsupported");
            tracing::debug!(content_type = %ct, "no decoder for request body");
            return Err(DecodeError::UnsupportedContentType(ct));
        };

        let decoded = decoder.decode_into(body);
        let outcome = if decoded.is_ok() { "ok" } else { "error" };
        metrics::record_decode(ct.as_str(), outcome);
        decoded
    }

    /// Decode the body into `T`, then run its bind hooks bottom-up.
    pub fn bind<T>(&self, ctx: &RequestContext, body: &[u8]) -> Result<T, BindError>
    where
        T: DeserializeOwned + BindNode,
    {
        let mut payload: T = self.decode(ctx, body)?;
        walk::bind(ctx, &mut payload)?;
        Ok(payload)
    }

    /// Run render hooks top-down, then negotiate and encode `payload`.
    ///
    /// A hook error aborts before anything is encoded.
    pub fn render<T>(&self, w: &mut ResponseWriter, ctx: &RequestContext, payload: &mut T) -> Result<(), WalkError>
    where
        T: RenderNode + Encodable,
    {
        walk::render(w, ctx, payload)?;
        self.respond(w, ctx, &*payload);
        Ok(())
    }

    /// [`render`](Self::render) for a list: every item's hooks, then the
    /// list as one value.
    pub fn render_list<T>(&self, w: &mut ResponseWriter, ctx: &RequestContext, items: &mut [T]) -> Result<(), WalkError>
    where
        T: RenderNode + Serialize,
    {
        for item in items.iter_mut() {
            walk::render(w, ctx, item)?;
        }
        let list: &[T] = items;
        self.respond(w, ctx, &list);
        Ok(())
    }

    /// Serve `events` as an event stream, or drain it into a list.
    pub async fn render_stream(&self, w: &mut ResponseWriter, ctx: &RequestContext, events: EventStream) {
        self.respond_stream(w, ctx, events).await;
    }

    /// Render `payload` into a complete response; hook failures become a 500
    /// [`ErrResponse`].
    pub fn render_response<T>(&self, ctx: &RequestContext, mut payload: T) -> Response
    where
        T: RenderNode + Encodable,
    {
        let mut w = ResponseWriter::new();
        match self.render(&mut w, ctx, &mut payload) {
            Ok(()) => w.into_response(),
            Err(err) => {
                tracing::error!(error = %err, path = %ctx.uri().path(), "render walk failed");
                self.render_error(ctx, ErrResponse::internal(err))
            }
        }
    }

    /// Render a list into a complete response.
    pub fn render_list_response<T>(&self, ctx: &RequestContext, mut items: Vec<T>) -> Response
    where
        T: RenderNode + Serialize,
    {
        let mut w = ResponseWriter::new();
        match self.render_list(&mut w, ctx, &mut items) {
            Ok(()) => w.into_response(),
            Err(err) => {
                tracing::error!(error = %err, path = %ctx.uri().path(), "render walk failed");
                self.render_error(ctx, ErrResponse::internal(err))
            }
        }
    }

    /// Render an error payload into a complete response.
    pub fn render_error(&self, ctx: &RequestContext, mut err: ErrResponse) -> Response {
        let mut w = ResponseWriter::new();
        if let Err(walk_err) = self.render(&mut w, ctx, &mut err) {
            tracing::error!(error = %walk_err, "error payload failed to render");
            let mut w = ResponseWriter::new();
            w.error(err.status_code, &err.to_string());
            return w.into_response();
        }
        w.into_response()
    }

    /// Serve `events` into a complete response.
    pub async fn stream_response(&self, ctx: &RequestContext, events: EventStream) -> Response {
        let mut w = ResponseWriter::new();
        self.respond_stream(&mut w, ctx, events).await;
        w.into_response()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Registry {
    /// Deep copy of both tables, taken under read locks.
    fn clone(&self) -> Self {
        let encoders = self.read_encoders().clone();
        let decoders = self.read_decoders().clone();
        Self::from_tables(encoders, decoders, self.frame_buffer)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("encoders", &self.supported_encoders())
            .field("decoders", &self.supported_decoders())
            .field("default_request", &self.default_request())
            .field("default_response", &self.default_response())
            .finish()
    }
}

fn validate_default(table: &EncoderTable, ct: &ContentType) -> Result<(), RegistryError> {
    if ct.is_none() {
        return Err(RegistryError::EmptyDefault);
    }
    if !table.map.contains_key(ct) {
        return Err(RegistryError::MissingDefaultEncoder(ct.clone()));
    }
    Ok(())
}

fn builtin_encoders() -> EncoderTable {
    let json: EncodeFn = encoders::encode_fn(encoders::json);
    let map = HashMap::from([
        (ContentType::DEFAULT, json.clone()),
        (ContentType::JSON, json),
        (ContentType::XML, encoders::encode_fn(encoders::xml)),
        (ContentType::EVENT_STREAM, encoders::encode_fn(stream::event_stream)),
    ]);
    EncoderTable {
        map,
        default_response: ContentType::DEFAULT,
    }
}

fn builtin_decoders() -> DecoderTable {
    let map = HashMap::from([
        (ContentType::JSON, decoders::decode_fn(decoders::json)),
        (ContentType::XML, decoders::text_decode_fn(decoders::xml)),
        (ContentType::FORM, decoders::text_decode_fn(decoders::form)),
    ]);
    DecoderTable {
        map,
        default_request: ContentType::NONE,
    }
}

/// Builds a [`Registry`], validating the default response type.
pub struct RegistryBuilder {
    encoders: EncoderTable,
    decoders: DecoderTable,
    frame_buffer: usize,
}

impl RegistryBuilder {
    /// Starts from the built-in codecs.
    pub fn new() -> Self {
        Self {
            encoders: builtin_encoders(),
            decoders: builtin_decoders(),
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }

    /// Starts with no codecs at all.
    pub fn empty() -> Self {
        Self {
            encoders: EncoderTable {
                map: HashMap::new(),
                default_response: ContentType::DEFAULT,
            },
            decoders: DecoderTable {
                map: HashMap::new(),
                default_request: ContentType::NONE,
            },
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }

    /// Built-in codecs adjusted by the `[negotiation]` section.
    pub fn from_config(config: &NegotiationConfig) -> Self {
        let mut builder = Self::new()
            .default_request(config.default_request.as_str())
            .default_response(config.default_response.as_str());
        if !config.event_stream {
            builder = builder.encoder(ContentType::EVENT_STREAM, None);
        }
        if config.html {
            builder = builder.encoder(ContentType::HTML, Some(encoders::encode_fn(encoders::html)));
        }
        if config.plain_text {
            builder = builder.encoder(
                ContentType::PLAIN_TEXT,
                Some(encoders::encode_fn(encoders::plain_text)),
            );
        }
        if config.octet_stream {
            builder = builder.encoder(ContentType::OCTET_STREAM, Some(encoders::encode_fn(encoders::data)));
        }
        builder
    }

    pub fn encoder(mut self, ct: impl Into<ContentType>, encoder: Option<EncodeFn>) -> Self {
        let ct = ct.into();
        match encoder {
            Some(encoder) => {
                self.encoders.map.insert(ct, encoder);
            }
            None => {
                self.encoders.map.remove(&ct);
            }
        }
        self
    }

    pub fn decoder(mut self, ct: impl Into<ContentType>, decoder: Option<DecodeFn>) -> Self {
        let ct = ct.into();
        match decoder {
            Some(decoder) => {
                self.decoders.map.insert(ct, decoder);
            }
            None => {
                self.decoders.map.remove(&ct);
            }
        }
        self
    }

    pub fn default_request(mut self, ct: impl Into<ContentType>) -> Self {
        self.decoders.default_request = ct.into();
        self
    }

    pub fn default_response(mut self, ct: impl Into<ContentType>) -> Self {
        self.encoders.default_response = ct.into();
        self
    }

    pub fn frame_buffer(mut self, frames: usize) -> Self {
        self.frame_buffer = frames.max(1);
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        validate_default(&self.encoders, &self.encoders.default_response)?;
        Ok(Registry::from_tables(self.encoders, self.decoders, self.frame_buffer))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
