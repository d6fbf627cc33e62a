//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! negotiation, decoding, streams:
//!     → tracing events (structured fields, filtered by EnvFilter)
//!     → metrics.rs (counters through the `metrics` facade)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → whatever recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics recorder; without one the
//!   counters are no-ops
//! - Subscriber setup belongs to binaries, not to library code paths

pub mod logging;
pub mod metrics;
