//! `application/x-www-form-urlencoded` decoder.

use serde_json::{Map, Value};

use super::DecodeError;

/// Decode pairs into an object of strings; repeated keys become arrays.
pub fn form(body: &[u8]) -> Result<Value, DecodeError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs() {
        let value = form(b"title=Hello+World&slug=hello%2Dworld").unwrap();
        assert_eq!(value, json!({"title": "Hello World", "slug": "hello-world"}));
    }

    #[test]
    fn test_repeated_keys() {
        let value = form(b"tag=a&tag=b&tag=c").unwrap();
        assert_eq!(value, json!({"tag": ["a", "b", "c"]}));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(form(b"").unwrap(), json!({}));
    }
}
