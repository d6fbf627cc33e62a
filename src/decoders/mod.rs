//! Request body decoders.
//!
//! # Responsibilities
//! - Define the decoder function signature stored in the registry
//! - Ship JSON, XML and urlencoded form decoders
//!
//! # Design Decisions
//! - Decoders produce a `serde_json::Value` tree; the registry deserializes
//!   it into the target type, so one decoder serves every payload type
//! - XML and form bodies carry every scalar as text; their decoders are
//!   marked [`Scalars::Text`] and numeric or boolean fields are parsed from
//!   the text while deserializing the target
//! - The HTTP glue collects the whole body first, so it is always consumed

pub mod form;
pub mod json;
mod text;
pub mod xml;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::negotiation::ContentType;

pub use form::form;
pub use json::json;
pub use xml::xml;

/// How a decoder represents scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalars {
    /// Numbers and booleans arrive as JSON numbers and booleans.
    Typed,
    /// Every scalar arrives as a string.
    Text,
}

/// Decoder entry stored in the registry.
#[derive(Clone)]
pub struct DecodeFn {
    decode: Arc<dyn Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync>,
    scalars: Scalars,
}

impl DecodeFn {
    pub fn scalars(&self) -> Scalars {
        self.scalars
    }

    /// The raw value tree of `body`.
    pub fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        (self.decode)(body)
    }

    /// Decode `body` and deserialize it into `T`.
    pub fn decode_into<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError> {
        let value = self.decode(body)?;
        let target = match self.scalars {
            Scalars::Typed => serde_json::from_value(value),
            Scalars::Text => T::deserialize(text::TextValue::new(value)),
        };
        target.map_err(DecodeError::Target)
    }
}

impl std::fmt::Debug for DecodeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeFn").field("scalars", &self.scalars).finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unable to automatically decode the request content type: '{0}'")]
    UnsupportedContentType(ContentType),

    #[error("JSON decode: {0}")]
    Json(#[source] serde_json::Error),

    #[error("XML decode: {0}")]
    Xml(String),

    #[error("form decode: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("request body does not match the expected shape: {0}")]
    Target(#[source] serde_json::Error),
}

impl DecodeError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DecodeError::UnsupportedContentType(_))
    }
}

/// Wrap a plain function as a [`DecodeFn`] producing typed scalars.
pub fn decode_fn<F>(f: F) -> DecodeFn
where
    F: Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync + 'static,
{
    DecodeFn {
        decode: Arc::new(f),
        scalars: Scalars::Typed,
    }
}

/// Wrap a decoder whose scalars are all strings, such as XML or form.
pub fn text_decode_fn<F>(f: F) -> DecodeFn
where
    F: Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync + 'static,
{
    DecodeFn {
        decode: Arc::new(f),
        scalars: Scalars::Text,
    }
}
