//! JSON decoder.

use serde_json::Value;

use super::DecodeError;

pub fn json(body: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(body).map_err(DecodeError::Json)
}
