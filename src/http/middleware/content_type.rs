//! Fixed response content type for a route.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::request::ContentTypeOverride;
use crate::negotiation::ContentType;

/// Answer with `ct` whatever the client accepts.
///
/// ```ignore
/// Router::new()
///     .route("/feed.xml", get(feed))
///     .layer(from_fn_with_state(ContentType::XML, force_content_type));
/// ```
pub async fn force_content_type(State(ct): State<ContentType>, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(ContentTypeOverride(ct));
    next.run(req).await
}
