//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Accept header(s)
//!     → accept.rs (parse, rank by quality, normalize)
//!     → ContentTypeSet (priority order, cursor)
//!     → registry::respond walks the cursor against registered encoders
//!
//! Content-Type header
//!     → accept.rs (essence, fallback to default request type)
//!     → registry decoder lookup
//! ```

pub mod accept;
pub mod content_type;

pub use accept::{accepted_content_types, parse_accept, request_content_type};
pub use content_type::{ContentType, ContentTypeSet};
