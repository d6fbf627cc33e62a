//! Per-request render state.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::http::request::{BodyLimit, RequestCancellation, DEFAULT_BODY_LIMIT};
use crate::registry::Registry;

/// State injected into [`with_render`].
#[derive(Clone)]
pub struct RenderState {
    pub registry: Arc<Registry>,
    pub body_limit: usize,
    /// Parent of every request token; cancelling it ends live streams.
    pub shutdown: CancellationToken,
}

impl RenderState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            body_limit: DEFAULT_BODY_LIMIT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Attach the registry, the body limit and a child cancellation token to the
/// request.
///
/// The token is cancelled once the response body is finished or dropped: at
/// once for a buffered body, when the client stops reading for a stream.
pub async fn with_render(State(state): State<RenderState>, mut req: Request, next: Next) -> Response {
    let cancel = state.shutdown.child_token();
    let extensions = req.extensions_mut();
    extensions.insert(Arc::clone(&state.registry));
    extensions.insert(BodyLimit(state.body_limit));
    extensions.insert(RequestCancellation(cancel.clone()));

    let guard = cancel.drop_guard();
    let response = next.run(req).await;
    if response.body().size_hint().exact().is_some() {
        return response;
    }

    response.map(|body| {
        Body::from_stream(body.into_data_stream().map(move |chunk| {
            let _request = &guard;
            chunk
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestContext;
    use crate::negotiation::ContentType;
    use axum::{routing::get, Router};
    use bytes::Bytes;
    use std::convert::Infallible;
    use std::sync::Mutex;
    use tower::ServiceExt;

    type Seen = Arc<Mutex<Option<CancellationToken>>>;

    fn remember(seen: &Seen, ctx: &RequestContext) {
        *seen.lock().unwrap() = Some(ctx.cancellation().clone());
    }

    fn seen_token(seen: &Seen) -> CancellationToken {
        seen.lock().unwrap().clone().unwrap()
    }

    #[tokio::test]
    async fn test_extensions_installed() {
        let registry = Arc::new(Registry::builder().default_request(ContentType::JSON).build().unwrap());
        let shutdown = CancellationToken::new();
        let state = RenderState::new(Arc::clone(&registry))
            .with_body_limit(64)
            .with_shutdown(shutdown.clone());

        let app = Router::new()
            .route(
                "/",
                get(|ctx: RequestContext| async move {
                    format!(
                        "{} {} {}",
                        ctx.registry().default_request(),
                        ctx.body_limit(),
                        ctx.cancellation().is_cancelled()
                    )
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state, with_render));

        shutdown.cancel();
        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"application/json 64 true");
    }

    #[tokio::test]
    async fn test_token_cancelled_after_buffered_response() {
        let seen = Seen::default();
        let handler_seen = Arc::clone(&seen);
        let app = Router::new()
            .route(
                "/",
                get(move |ctx: RequestContext| {
                    remember(&handler_seen, &ctx);
                    async { "done" }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                RenderState::new(Arc::new(Registry::new())),
                with_render,
            ));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(seen_token(&seen).is_cancelled());
        assert_eq!(&axum::body::to_bytes(response.into_body(), 64).await.unwrap()[..], b"done");
    }

    #[tokio::test]
    async fn test_token_lives_until_stream_body_dropped() {
        let seen = Seen::default();
        let handler_seen = Arc::clone(&seen);
        let app = Router::new()
            .route(
                "/",
                get(move |ctx: RequestContext| {
                    remember(&handler_seen, &ctx);
                    async {
                        let chunks = vec![Ok::<_, Infallible>(Bytes::from_static(b"a")), Ok(Bytes::from_static(b"b"))];
                        Body::from_stream(futures_util::stream::iter(chunks))
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                RenderState::new(Arc::new(Registry::new())),
                with_render,
            ));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let token = seen_token(&seen);
        assert!(!token.is_cancelled());

        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"ab");
        assert!(token.is_cancelled());
    }
}
