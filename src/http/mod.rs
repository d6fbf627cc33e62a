//! HTTP glue between axum and the registry.
//!
//! # Data Flow
//! ```text
//! axum Request
//!     → middleware/ (registry, body limit, cancellation token, override)
//!     → request.rs (RequestContext snapshot, status hint)
//!     → extract.rs (Bound<T>: collect, decode, bind)
//!     → handler → registry render
//!     → response.rs (ResponseWriter → axum Response)
//! ```

pub mod extract;
pub mod middleware;
pub mod request;
pub mod response;

pub use extract::Bound;
pub use middleware::{force_content_type, with_render, RenderState};
pub use request::{BodyLimit, ContentTypeOverride, RequestCancellation, RequestContext, DEFAULT_BODY_LIMIT};
pub use response::ResponseWriter;
