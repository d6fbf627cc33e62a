//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tokio::net::TcpListener;

use payload_render::http::{with_render, RenderState};
use payload_render::lifecycle::Shutdown;
use payload_render::Registry;

/// A running test server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serve `router` behind the render middleware on an ephemeral port.
pub async fn spawn_app(router: Router, registry: Registry, body_limit: usize) -> TestServer {
    let shutdown = Shutdown::new();
    let state = RenderState::new(Arc::new(registry))
        .with_body_limit(body_limit)
        .with_shutdown(shutdown.token());
    let app = router.layer(from_fn_with_state(state, with_render));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, shutdown }
}
