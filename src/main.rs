//! render-demo: a small articles service on top of `payload_render`.
//!
//! ```text
//! GET  /articles       list, negotiated (JSON, XML, text/plain if enabled)
//! GET  /articles/{id}  one article, 404 as an ErrResponse
//! DELETE /articles/{id} 204, 404 as an ErrResponse
//! POST /articles       Bound<NewArticle> (JSON, XML or form), 201
//! GET  /ticks          event stream, or a list when SSE is not accepted
//! GET  /error          a 503 ErrResponse with advisory headers
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use payload_render::config::{load_config, RenderConfig};
use payload_render::errors::{self, ErrorSettings};
use payload_render::http::{with_render, RenderState};
use payload_render::lifecycle::{wait_for_signal, Shutdown};
use payload_render::observability::logging;
use payload_render::registry::{self, RegistryBuilder};
use payload_render::{Binder, BoxError, Bound, ErrResponse, EventStream, RequestContext, Renderer, ResponseWriter};

#[derive(Debug, Parser)]
#[command(name = "render-demo", version, about = "Payload rendering demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Article {
    id: u64,
    title: String,
    body: String,
    url: String,
}

impl Renderer for Article {
    fn render(&mut self, _w: &mut ResponseWriter, _r: &RequestContext) -> Result<(), BoxError> {
        self.url = format!("/articles/{}", self.id);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct NewArticle {
    title: String,
    #[serde(default)]
    body: String,
}

impl Binder for NewArticle {
    fn bind(&mut self, _r: &RequestContext) -> Result<(), BoxError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err("title is required".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Tick {
    n: u64,
    label: String,
}

impl Renderer for Tick {
    fn render(&mut self, _w: &mut ResponseWriter, _r: &RequestContext) -> Result<(), BoxError> {
        self.label = format!("tick {}", self.n);
        Ok(())
    }
}

#[derive(Default)]
struct AppState {
    articles: RwLock<Vec<Article>>,
    next_id: AtomicU64,
}

async fn list_articles(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Response {
    let articles = state.articles.read().await.clone();
    ctx.registry().render_list_response(&ctx, articles)
}

async fn get_article(State(state): State<Arc<AppState>>, Path(id): Path<u64>, ctx: RequestContext) -> Response {
    let found = state.articles.read().await.iter().find(|a| a.id == id).cloned();
    match found {
        Some(article) => ctx.registry().render_response(&ctx, article),
        None => ctx.registry().render_error(&ctx, ErrResponse::not_found()),
    }
}

async fn delete_article(State(state): State<Arc<AppState>>, Path(id): Path<u64>, ctx: RequestContext) -> Response {
    let removed = {
        let mut articles = state.articles.write().await;
        let before = articles.len();
        articles.retain(|a| a.id != id);
        articles.len() < before
    };
    if !removed {
        return ctx.registry().render_error(&ctx, ErrResponse::not_found());
    }

    let mut w = ResponseWriter::new();
    w.no_content();
    w.into_response()
}

async fn create_article(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Bound(new): Bound<NewArticle>,
) -> Response {
    let article = Article {
        id: state.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        title: new.title,
        body: new.body,
        url: String::new(),
    };
    state.articles.write().await.push(article.clone());
    tracing::info!(id = article.id, "article created");

    ctx.set_status(StatusCode::CREATED);
    ctx.registry().render_response(&ctx, article)
}

async fn ticks(ctx: RequestContext) -> Response {
    let (tx, rx) = mpsc::channel(8);
    let cancel = ctx.cancellation().clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        for n in 1..=5 {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = interval.tick() => {}
            }
            if tx.send(Tick { n, label: String::new() }).await.is_err() {
                return;
            }
        }
    });

    ctx.registry()
        .stream_response(&ctx, EventStream::rendered_channel(rx))
        .await
}

async fn fail(ctx: RequestContext) -> Response {
    let err = ErrResponse::with_error(StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable");
    ctx.registry().render_error(&ctx, err)
}

#[allow(deprecated)]
fn build_router(config: &RenderConfig, state: Arc<AppState>, render: RenderState) -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route("/articles/{id}", get(get_article).delete(delete_article))
        .route("/ticks", get(ticks))
        .route("/error", get(fail))
        .with_state(state)
        .layer(from_fn_with_state(render, with_render))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("render-demo v{} starting", env!("CARGO_PKG_VERSION"));

    errors::configure(ErrorSettings::from_config(&config.errors));

    let registry = RegistryBuilder::from_config(&config.negotiation)
        .frame_buffer(config.stream.frame_buffer)
        .build()?;
    let registry = registry::install(registry)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let render = RenderState::new(registry)
        .with_body_limit(config.limits.max_body_bytes)
        .with_shutdown(shutdown.token());
    let app = build_router(&config, Arc::new(AppState::default()), render);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            shutdown.trigger();
        })
        .await?;

    tracing::info!("render-demo stopped");
    Ok(())
}
