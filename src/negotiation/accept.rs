//! `Accept` and `Content-Type` header handling.
//!
//! # Responsibilities
//! - Parse client preferences into a priority-ordered set
//! - Resolve the declared content type of a request body
//!
//! # Design Decisions
//! - Never fails: a malformed token is skipped, a malformed header degrades
//!   to the default response type downstream
//! - Media types are lower-cased, parameters other than `q` are dropped
//! - Stable sort, so equal qualities keep the client's order

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::HeaderMap;

use super::content_type::{ContentType, ContentTypeSet};

/// Parse a comma separated `type/subtype[;q=value]` list.
pub fn parse_accept(header: &str) -> ContentTypeSet {
    let mut ranked: Vec<(ContentType, f32)> = header
        .split(',')
        .filter_map(parse_media_range)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ContentTypeSet::new(ranked.into_iter().map(|(ct, _)| ct))
}

/// All `Accept` header lines of a request, parsed as one list.
pub fn accepted_content_types(headers: &HeaderMap) -> ContentTypeSet {
    let joined = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");
    parse_accept(&joined)
}

/// The essence of the request's `Content-Type`, or `fallback`.
pub fn request_content_type(headers: &HeaderMap, fallback: &ContentType) -> ContentType {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(essence)
        .map(ContentType::from)
        .unwrap_or_else(|| fallback.clone())
}

fn parse_media_range(token: &str) -> Option<(ContentType, f32)> {
    let mut parts = token.split(';');
    let media = essence(parts.next()?)?;

    let mut quality = 1.0_f32;
    for param in parts {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("q") {
            let q: f32 = value.trim().parse().ok()?;
            if q.is_nan() {
                return None;
            }
            quality = q.clamp(0.0, 1.0);
        }
    }

    Some((ContentType::from(media), quality))
}

/// `type/subtype`, lower-cased, or `None` when the shape is wrong.
fn essence(raw: &str) -> Option<String> {
    let media = raw.split(';').next()?.trim();
    let (kind, subtype) = media.split_once('/')?;
    let valid = |s: &str| !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '/');
    if !valid(kind) || !valid(subtype) {
        return None;
    }
    Some(media.to_ascii_lowercase())
}
