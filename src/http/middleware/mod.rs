//! Request middleware.
//!
//! Installed with `axum::middleware::from_fn_with_state`:
//! ```text
//! with_render         → registry, body limit, cancellation token
//! force_content_type  → fixed response content type for a route
//! ```

pub mod content_type;
pub mod render;

pub use content_type::force_content_type;
pub use render::{with_render, RenderState};
