//! Codec registry and the bind / render entry points.
//!
//! # Responsibilities
//! - Map content types to encoders and decoders (`controller.rs`)
//! - Negotiate and write responses, including event streams (`respond.rs`)
//! - Hold the process-wide default registry (`global.rs`)
//!
//! # Data Flow
//! ```text
//! inbound:  body bytes → decoder (Content-Type) → T → bind hooks (bottom-up)
//! outbound: T → render hooks (top-down) → negotiate (Accept) → encoder → writer
//! ```

pub mod controller;
pub mod global;
pub mod respond;

pub use controller::{BindError, Registry, RegistryBuilder, RegistryError, DEFAULT_FRAME_BUFFER};
pub use global::{
    bind, global, install, render, render_list, render_stream, set_decoder, set_encoder, status,
    supported_decoders, supported_encoders,
};
