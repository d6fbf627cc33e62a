//! Response encoders.
//!
//! # Responsibilities
//! - Define the encoder function signature stored in the registry
//! - Erase outbound values behind [`Encodable`]
//! - Ship JSON, XML, plain-text, HTML and raw bytes encoders
//!
//! # Design Decisions
//! - An encoder that cannot represent a value returns
//!   [`EncodeError::CannotEncode`] and negotiation moves to the next type
//! - Encoders build the whole body before touching the writer, so a failing
//!   encoder leaves the response untouched
//! - The status hint is applied right before the body is written

pub mod data;
pub mod helpers;
pub mod html;
pub mod json;
pub mod text;
pub mod xml;

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::errors::BoxError;
use crate::http::{RequestContext, ResponseWriter};
use crate::walk::{Binder, Renderer};

pub use data::data;
pub use html::html;
pub use json::json;
pub use text::plain_text;
pub use xml::xml;

/// Encoder entry stored in the registry.
pub type EncodeFn =
    Arc<dyn Fn(&mut ResponseWriter, &RequestContext, &dyn Encodable) -> Result<(), EncodeError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum EncodeError {
    /// Try the next acceptable content type.
    #[error("can not encode object")]
    CannotEncode,

    #[error("JSON encode: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encode: {0}")]
    Xml(String),

    #[error(transparent)]
    Other(BoxError),
}

impl EncodeError {
    pub fn is_cannot_encode(&self) -> bool {
        matches!(self, EncodeError::CannotEncode)
    }
}

/// Erased view of an outbound value.
///
/// Every `Serialize` type is `Encodable`. Values that only have a textual
/// form go through [`Text`] or [`Html`].
pub trait Encodable {
    /// Structured form, used by the JSON and XML encoders.
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    /// Plain-text form, if the value has one.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Markup form, if the value has one.
    fn to_html(&self) -> Option<String> {
        None
    }

    /// Raw byte form; defaults to the text form.
    fn to_bytes(&self) -> Option<Vec<u8>> {
        self.to_text().map(String::into_bytes)
    }

    /// Type name of the value, used for XML root elements.
    fn type_name(&self) -> &'static str;
}

impl<T: Serialize + ?Sized> Encodable for T {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn to_text(&self) -> Option<String> {
        match serde_json::to_value(self) {
            Ok(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value rendered through its `Display` form as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text<T>(pub T);

impl<T: Display> Encodable for Text<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::String(self.0.to_string()))
    }

    fn to_text(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    fn type_name(&self) -> &'static str {
        "text"
    }
}

impl<T> Renderer for Text<T> {}
impl<T> Binder for Text<T> {}

/// Markup rendered as-is by the HTML encoder, as text elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Html<T>(pub T);

impl<T: Display> Encodable for Html<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::String(self.0.to_string()))
    }

    fn to_text(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    fn to_html(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    fn type_name(&self) -> &'static str {
        "html"
    }
}

impl<T> Renderer for Html<T> {}
impl<T> Binder for Html<T> {}

/// Bytes written as-is by the octet-stream encoder, as a list of numbers
/// by the structured encoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data<T>(pub T);

impl<T: AsRef<[u8]>> Encodable for Data<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.0.as_ref())
    }

    fn to_bytes(&self) -> Option<Vec<u8>> {
        Some(self.0.as_ref().to_vec())
    }

    fn type_name(&self) -> &'static str {
        "data"
    }
}

impl<T> Renderer for Data<T> {}
impl<T> Binder for Data<T> {}

/// Wrap a plain function as an [`EncodeFn`].
pub fn encode_fn<F>(f: F) -> EncodeFn
where
    F: Fn(&mut ResponseWriter, &RequestContext, &dyn Encodable) -> Result<(), EncodeError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Greeting {
        greeting: &'static str,
    }

    #[test]
    fn test_serialize_values_are_encodable() {
        let v: &dyn Encodable = &Greeting { greeting: "hello" };
        assert_eq!(v.to_value().unwrap(), serde_json::json!({"greeting": "hello"}));
        assert!(v.to_text().is_none());
        assert!(v.type_name().ends_with("Greeting"));
    }

    #[test]
    fn test_strings_have_text() {
        let v: &dyn Encodable = &"plain";
        assert_eq!(v.to_text().as_deref(), Some("plain"));
        let n: &dyn Encodable = &42;
        assert!(n.to_text().is_none());
    }

    #[test]
    fn test_wrappers() {
        let t = Text(7);
        assert_eq!(t.to_text().as_deref(), Some("7"));
        assert!(t.to_html().is_none());

        let h = Html("<b>hi</b>");
        assert_eq!(h.to_html().as_deref(), Some("<b>hi</b>"));
        assert_eq!(h.to_value().unwrap(), Value::String("<b>hi</b>".into()));

        let d = Data(b"ab");
        assert_eq!(d.to_bytes().unwrap(), b"ab");
        assert_eq!(d.to_value().unwrap(), serde_json::json!([97, 98]));
        assert!(d.to_text().is_none());
    }
}
