//! XML encoder.
//!
//! Values are written from their structured form:
//! - the root element is named after the value's type, `list` for sequences
//! - object keys starting with `@` become attributes, `$text` becomes text
//! - sequences under a key repeat the element, sequences at the root use `item`
//! - `null` becomes an empty element

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};

use crate::http::{RequestContext, ResponseWriter};

use super::helpers::write_body;
use super::{EncodeError, Encodable};

pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

pub const ATTRIBUTE_PREFIX: char = '@';
pub const TEXT_KEY: &str = "$text";

const LIST_ROOT: &str = "list";
const LIST_ITEM: &str = "item";

/// Serialize as an XML document with a leading declaration.
pub fn xml(w: &mut ResponseWriter, r: &RequestContext, v: &dyn Encodable) -> Result<(), EncodeError> {
    let value = v.to_value()?;
    let body = to_document(&root_name(v.type_name()), &value)?;

    write_body(w, r, CONTENT_TYPE, &body);
    Ok(())
}

/// `alloc::vec::Vec<my::Item>` → `Vec`, `my::Article` → `Article`.
fn root_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base).trim_start_matches('&');
    if is_xml_name(short) {
        short.to_string()
    } else {
        "value".to_string()
    }
}

fn to_document(root: &str, value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    writer.get_mut().push(b'\n');

    match value {
        Value::Array(items) => {
            emit(&mut writer, Event::Start(BytesStart::new(LIST_ROOT)))?;
            for item in items {
                write_element(&mut writer, LIST_ITEM, item)?;
            }
            emit(&mut writer, Event::End(BytesEnd::new(LIST_ROOT)))?;
        }
        other => write_element(&mut writer, root, other)?,
    }

    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), EncodeError> {
    if !is_xml_name(name) {
        return Err(EncodeError::Xml(format!("invalid element name {name:?}")));
    }

    match value {
        Value::Null => emit(writer, Event::Empty(BytesStart::new(name))),
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| write_element(writer, name, item)),
        Value::Object(map) => write_object(writer, name, map),
        scalar => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            emit(writer, Event::Text(BytesText::new(&scalar_text(scalar))))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

fn write_object(writer: &mut Writer<Vec<u8>>, name: &str, map: &Map<String, Value>) -> Result<(), EncodeError> {
    let mut start = BytesStart::new(name);
    let mut text = None;
    let mut children = Vec::new();

    for (key, value) in map {
        if let Some(attr) = key.strip_prefix(ATTRIBUTE_PREFIX) {
            if !is_xml_name(attr) {
                return Err(EncodeError::Xml(format!("invalid attribute name {attr:?}")));
            }
            start.push_attribute((attr, scalar_text(value).as_str()));
        } else if key == TEXT_KEY {
            text = Some(scalar_text(value));
        } else {
            children.push((key, value));
        }
    }

    if text.is_none() && children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = text {
        emit(writer, Event::Text(BytesText::new(&text)))?;
    }
    for (key, value) in children {
        write_element(writer, key, value)?;
    }
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), EncodeError> {
    writer
        .write_event(event)
        .map_err(|e| EncodeError::Xml(e.to_string()))
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}
