//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → RenderConfig (validated, immutable)
//!     → Registry::from_config, ErrorSettings::from_config, RenderState
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ErrorsConfig, LimitsConfig, NegotiationConfig, ObservabilityConfig, RenderConfig, ServerConfig, StreamConfig,
};
pub use validation::{validate_config, ValidationError};
