//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for binaries and tests
//! - Resolve the log filter from `RUST_LOG`, else the configured level
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - A second initialization is reported, not fatal

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: `level` for this crate and
/// `tower_http`, warnings elsewhere.
pub fn default_filter(level: &str) -> String {
    format!("warn,payload_render={level},render_demo={level},tower_http={level}")
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
