//! Raw bytes encoder.

use crate::http::{RequestContext, ResponseWriter};

use super::helpers::write_body;
use super::{EncodeError, Encodable};

pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Write the value's byte form; values without one are refused.
pub fn data(w: &mut ResponseWriter, r: &RequestContext, v: &dyn Encodable) -> Result<(), EncodeError> {
    let bytes = v.to_bytes().ok_or(EncodeError::CannotEncode)?;
    write_body(w, r, CONTENT_TYPE, &bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::{Data, Text};
    use axum::http::header::CONTENT_TYPE as CT;
    use axum::http::{Request, StatusCode};

    fn ctx() -> RequestContext {
        RequestContext::from(&Request::builder().body(()).unwrap())
    }

    #[test]
    fn test_bytes_with_status_hint() {
        let ctx = ctx();
        ctx.set_status(StatusCode::ACCEPTED);
        let mut w = ResponseWriter::new();
        data(&mut w, &ctx, &Data(vec![0u8, 159, 146, 150])).unwrap();

        assert_eq!(w.status(), StatusCode::ACCEPTED);
        assert_eq!(w.body(), [0u8, 159, 146, 150]);
        assert_eq!(w.headers()[CT], CONTENT_TYPE);
        assert_eq!(w.headers()["x-content-type-options"], "nosniff");
    }

    #[test]
    fn test_text_values_as_bytes() {
        let mut w = ResponseWriter::new();
        data(&mut w, &ctx(), &"hello").unwrap();
        assert_eq!(w.body(), b"hello");

        let mut w = ResponseWriter::new();
        data(&mut w, &ctx(), &Text(12)).unwrap();
        assert_eq!(w.body(), b"12");
    }

    #[test]
    fn test_structured_value_refused() {
        let mut w = ResponseWriter::new();
        let err = data(&mut w, &ctx(), &serde_json::json!({"n": 1})).unwrap_err();
        assert!(err.is_cannot_encode());
        assert!(!w.is_committed());
    }
}
