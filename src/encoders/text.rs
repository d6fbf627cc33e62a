//! Plain-text encoder.

use crate::http::{RequestContext, ResponseWriter};

use super::helpers::write_body;
use super::{EncodeError, Encodable};

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Write the value's text form; values without one are refused.
pub fn plain_text(w: &mut ResponseWriter, r: &RequestContext, v: &dyn Encodable) -> Result<(), EncodeError> {
    let text = v.to_text().ok_or(EncodeError::CannotEncode)?;
    write_body(w, r, CONTENT_TYPE, text.as_bytes());
    Ok(())
}
