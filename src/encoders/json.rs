//! JSON encoder.

use crate::http::{RequestContext, ResponseWriter};

use super::helpers::write_body;
use super::{EncodeError, Encodable};

pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serialize as JSON with HTML-sensitive characters escaped and a trailing
/// newline.
pub fn json(w: &mut ResponseWriter, r: &RequestContext, v: &dyn Encodable) -> Result<(), EncodeError> {
    let value = v.to_value()?;
    let mut body = escape_html(serde_json::to_vec(&value)?);
    body.push(b'\n');

    write_body(w, r, CONTENT_TYPE, &body);
    Ok(())
}

/// Replace `<`, `>`, `&`, U+2028 and U+2029 with `\u` escapes.
///
/// These only occur inside JSON strings, so the output stays valid JSON.
fn escape_html(raw: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 16);
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'<' => out.extend_from_slice(b"\\u003c"),
            b'>' => out.extend_from_slice(b"\\u003e"),
            b'&' => out.extend_from_slice(b"\\u0026"),
            0xE2 if raw.get(i + 1) == Some(&0x80) && matches!(raw.get(i + 2), Some(0xA8 | 0xA9)) => {
                if raw[i + 2] == 0xA8 {
                    out.extend_from_slice(b"\\u2028");
                } else {
                    out.extend_from_slice(b"\\u2029");
                }
                i += 3;
                continue;
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}
