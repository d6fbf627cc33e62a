//! Header and status helpers shared by encoders.

use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::HeaderValue;

use crate::http::{RequestContext, ResponseWriter};

pub fn set_no_sniff(w: &mut ResponseWriter) {
    w.headers_mut()
        .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
}

pub fn set_content_type(w: &mut ResponseWriter, value: &'static str) {
    w.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(value));
}

/// Commit the status hint of the request, if one was set.
pub fn write_status(w: &mut ResponseWriter, r: &RequestContext) {
    if let Some(status) = r.status_hint() {
        w.write_status(status);
    }
}

/// Headers, status and body in the order every encoder writes them.
pub fn write_body(w: &mut ResponseWriter, r: &RequestContext, content_type: &'static str, body: &[u8]) {
    set_no_sniff(w);
    set_content_type(w, content_type);
    write_status(w, r);
    w.write(body);
}
