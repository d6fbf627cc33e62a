//! HTML encoder.

use crate::http::{RequestContext, ResponseWriter};

use super::helpers::write_body;
use super::{EncodeError, Encodable};

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Write the value's markup form, falling back to its text form.
pub fn html(w: &mut ResponseWriter, r: &RequestContext, v: &dyn Encodable) -> Result<(), EncodeError> {
    let markup = v
        .to_html()
        .or_else(|| v.to_text())
        .ok_or(EncodeError::CannotEncode)?;
    write_body(w, r, CONTENT_TYPE, markup.as_bytes());
    Ok(())
}
