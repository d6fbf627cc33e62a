//! `Bound<T>`: a request body decoded and bound in one extractor.

use std::ops::{Deref, DerefMut};

use axum::extract::{FromRequest, Request};
use axum::response::Response;
use serde::de::DeserializeOwned;

use crate::errors::ErrResponse;
use crate::walk::BindNode;

use super::RequestContext;

/// Extracts `T` from the request body by its `Content-Type`, then runs its
/// bind hooks.
///
/// Rejections are rendered as [`ErrResponse`] payloads: 413 for bodies over
/// the limit, 415 for content types without a decoder, 400 for malformed
/// bodies and 422 for failed bind hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bound<T>(pub T);

impl<T> Bound<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Bound<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Bound<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<S, T> FromRequest<S> for Bound<T>
where
    S: Send + Sync,
    T: DeserializeOwned + BindNode + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let ctx = RequestContext::from_parts(&parts);
        let registry = ctx.registry();

        // Collecting fails on the limit or on a connection the client dropped.
        let bytes = match axum::body::to_bytes(body, ctx.body_limit()).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(error = %err, limit = ctx.body_limit(), "request body rejected");
                return Err(registry.render_error(&ctx, ErrResponse::payload_too_large(err)));
            }
        };

        registry.bind(&ctx, &bytes).map(Bound).map_err(|err| {
            tracing::debug!(error = %err, path = %ctx.uri().path(), "request bind failed");
            registry.render_error(&ctx, ErrResponse::from(err))
        })
    }
}
