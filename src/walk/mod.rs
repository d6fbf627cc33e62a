//! Recursive payload traversal.
//!
//! # Data Flow
//! ```text
//! Outbound (render.rs, top-down):
//!     node.render(w, r) → node.render_children(walk) → child.render(..) → ...
//!
//! Inbound (bind.rs, bottom-up):
//!     node.bind_children(walk) → ... → child.bind(r) → node.bind(r)
//! ```
//!
//! # Design Decisions
//! - Children are enumerated explicitly by each node, no reflection
//! - `Option`, `Vec`, arrays and `Box` are uniform children via adapter traits
//! - The first hook error aborts the whole walk
//! - Owned trees walked through `&mut` cannot contain cycles

pub mod bind;
pub mod render;

use thiserror::Error;

use crate::errors::BoxError;

pub use bind::{bind, BindNode, BindWalk, Binder, NilBinder};
pub use render::{render, NilRender, RenderNode, RenderWalk, Renderer};

/// A hook failed during a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("render hook of {node} failed: {source}")]
    Render {
        node: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("bind hook of {node} failed: {source}")]
    Bind {
        node: &'static str,
        #[source]
        source: BoxError,
    },
}

impl WalkError {
    /// The error returned by the hook itself.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            WalkError::Render { source, .. } | WalkError::Bind { source, .. } => source.as_ref(),
        }
    }

    /// Type name of the node whose hook failed.
    pub fn node(&self) -> &'static str {
        match self {
            WalkError::Render { node, .. } | WalkError::Bind { node, .. } => node,
        }
    }
}

/// No-op `Renderer` and `Binder` for leaf types that carry no hooks.
macro_rules! leaf_nodes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Renderer for $ty {}
            impl Binder for $ty {}
        )*
    };
}

leaf_nodes!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str, (), serde_json::Value,
);
