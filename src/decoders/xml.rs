//! XML decoder.
//!
//! Produces the content of the root element, mirroring the XML encoder:
//! attributes become `@name` keys, mixed text becomes `$text`, repeated
//! child elements become arrays, a text-only element becomes a string and an
//! empty element without attributes becomes `null`. Scalars stay strings
//! and are parsed while deserializing typed fields (see [`super::Scalars`]).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::encoders::xml::{ATTRIBUTE_PREFIX, TEXT_KEY};

use super::DecodeError;

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = format!(
                "{ATTRIBUTE_PREFIX}{}",
                String::from_utf8_lossy(attr.key.as_ref())
            );
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            fields.insert(key, Value::String(value));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let value = match (self.fields.is_empty(), self.text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(self.text),
            (false, true) => Value::Object(self.fields),
            (false, false) => {
                let mut fields = self.fields;
                fields.insert(TEXT_KEY.to_string(), Value::String(self.text));
                Value::Object(fields)
            }
        };
        (self.name, value)
    }
}

pub fn xml(body: &[u8]) -> Result<Value, DecodeError> {
    let mut reader = Reader::from_reader(body);
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Element::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => add_child(&mut parent.fields, name, value),
                    None => return Ok(value),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                let trimmed = text.trim();
                if let (Some(current), false) = (stack.last_mut(), trimmed.is_empty()) {
                    current.text.push_str(trimmed);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(DecodeError::Xml("unbalanced closing tag".to_string()));
                };
                let (name, value) = element.close();
                match stack.last_mut() {
                    Some(parent) => add_child(&mut parent.fields, name, value),
                    None => return Ok(value),
                }
            }
            Event::Eof => {
                return Err(DecodeError::Xml(if stack.is_empty() {
                    "document has no root element".to_string()
                } else {
                    "unexpected end of document".to_string()
                }));
            }
            _ => {}
        }
    }
}

fn add_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn xml_error(err: impl std::fmt::Display) -> DecodeError {
    DecodeError::Xml(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_document() {
        let value = xml(
            br#"<?xml version="1.0" encoding="UTF-8"?>
            <person id="13">
                <name><first>John</first><last>Doe</last></name>
                <age>42</age>
                <tag>a</tag><tag>b</tag>
                <nickname/>
            </person>"#,
        )
        .unwrap();

        assert_eq!(
            value,
            json!({
                "@id": "13",
                "name": {"first": "John", "last": "Doe"},
                "age": "42",
                "tag": ["a", "b"],
                "nickname": null
            })
        );
    }

    #[test]
    fn test_text_with_attributes() {
        let value = xml(br#"<note lang="en">a &lt; b</note>"#).unwrap();
        assert_eq!(value, json!({"@lang": "en", "$text": "a < b"}));
    }

    #[test]
    fn test_text_root() {
        assert_eq!(xml(b"<greeting>hello</greeting>").unwrap(), json!("hello"));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(xml(b"<a><b></a>"), Err(DecodeError::Xml(_))));
        assert!(matches!(xml(b""), Err(DecodeError::Xml(_))));
        assert!(matches!(xml(b"<open>"), Err(DecodeError::Xml(_))));
    }
}
