//! The request as seen by hooks, encoders and decoders.
//!
//! # Responsibilities
//! - Snapshot method, URI, version, headers and extensions of a request
//! - Carry the response status hint set by render hooks
//! - Carry the request's cancellation token
//! - Resolve the registry serving this request
//!
//! # Design Decisions
//! - Clones share the status hint: a clone is the same request
//! - A request without a cancellation extension gets a token nobody cancels
//! - Status 0 in the atomic slot means "no hint"

use std::convert::Infallible;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, StatusCode, Uri, Version};
use tokio_util::sync::CancellationToken;

use crate::negotiation::ContentType;
use crate::registry::{self, Registry};

/// Default cap on collected request bodies (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Request extension: the token cancelled when the request is abandoned.
#[derive(Debug, Clone)]
pub struct RequestCancellation(pub CancellationToken);

/// Request extension: maximum body size accepted by [`Bound`](super::Bound).
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(DEFAULT_BODY_LIMIT)
    }
}

/// Request extension: skip negotiation and answer with this content type.
#[derive(Debug, Clone)]
pub struct ContentTypeOverride(pub ContentType);

/// Request snapshot handed to every hook and codec.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    status: Arc<AtomicU16>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Snapshot the head of a request.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::snapshot(&parts.method, &parts.uri, parts.version, &parts.headers, &parts.extensions)
    }

    fn snapshot(
        method: &Method,
        uri: &Uri,
        version: Version,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        let cancel = extensions
            .get::<RequestCancellation>()
            .map(|c| c.0.clone())
            .unwrap_or_else(CancellationToken::new);

        Self {
            method: method.clone(),
            uri: uri.clone(),
            version,
            headers: headers.clone(),
            extensions: extensions.clone(),
            status: Arc::new(AtomicU16::new(0)),
            cancel,
        }
    }

    /// Replace the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Record the status the response should be written with.
    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Release);
    }

    /// The status recorded by [`set_status`](Self::set_status), if any.
    pub fn status_hint(&self) -> Option<StatusCode> {
        match self.status.load(Ordering::Acquire) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The per-request content type override, if a middleware set one.
    pub fn content_type_override(&self) -> Option<&ContentType> {
        self.extensions.get::<ContentTypeOverride>().map(|o| &o.0)
    }

    /// The registry installed by [`with_render`](super::with_render), else
    /// the process-wide one.
    pub fn registry(&self) -> Arc<Registry> {
        self.extensions
            .get::<Arc<Registry>>()
            .cloned()
            .unwrap_or_else(registry::global)
    }

    /// Body limit for this request.
    pub fn body_limit(&self) -> usize {
        self.extensions
            .get::<BodyLimit>()
            .copied()
            .unwrap_or_default()
            .0
    }
}

impl Clone for RequestContext {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            uri: self.uri.clone(),
            version: self.version,
            headers: self.headers.clone(),
            extensions: self.extensions.clone(),
            status: Arc::clone(&self.status),
            cancel: self.cancel.clone(),
        }
    }
}

impl<B> From<&Request<B>> for RequestContext {
    fn from(req: &Request<B>) -> Self {
        Self::snapshot(req.method(), req.uri(), req.version(), req.headers(), req.extensions())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_hint_shared_by_clones() {
        let req = Request::builder().uri("/a").body(()).unwrap();
        let ctx = RequestContext::from(&req);
        assert!(ctx.status_hint().is_none());

        let clone = ctx.clone();
        clone.set_status(StatusCode::CREATED);
        assert_eq!(ctx.status_hint(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_reads_extensions() {
        let token = CancellationToken::new();
        let req = Request::builder()
            .extension(RequestCancellation(token.clone()))
            .extension(BodyLimit(10))
            .extension(ContentTypeOverride(ContentType::XML))
            .body(())
            .unwrap();
        let ctx = RequestContext::from(&req);

        assert_eq!(ctx.body_limit(), 10);
        assert_eq!(ctx.content_type_override(), Some(&ContentType::XML));
        token.cancel();
        assert!(ctx.cancellation().is_cancelled());
    }

    #[test]
    fn test_parts_and_request_agree() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/items?page=2")
            .header("accept", "application/xml")
            .extension(BodyLimit(32))
            .body(())
            .unwrap();
        let from_request = RequestContext::from(&req);
        let (parts, ()) = req.into_parts();
        let from_parts = RequestContext::from_parts(&parts);

        for ctx in [&from_request, &from_parts] {
            assert_eq!(ctx.method(), &Method::POST);
            assert_eq!(ctx.uri().query(), Some("page=2"));
            assert_eq!(ctx.headers()["accept"], "application/xml");
            assert_eq!(ctx.body_limit(), 32);
        }
    }

    #[test]
    fn test_defaults_without_extensions() {
        let req = Request::builder().body(()).unwrap();
        let ctx = RequestContext::from(&req);
        assert_eq!(ctx.body_limit(), DEFAULT_BODY_LIMIT);
        assert!(ctx.content_type_override().is_none());
        assert!(!ctx.cancellation().is_cancelled());
    }
}
