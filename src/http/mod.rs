//! HTTP glue around the pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → handlers.rs (deserialize, defaults, dispatch to pipeline)
//!     → JSON response (correlation id embedded on both outcomes)
//! ```
//!
//! # Design Decisions
//! - Handlers are thin: validation stops malformed input at the extractor,
//!   the pipeline never sees it
//! - Persistence failures map to 500 with the correlation id in the body so
//!   a caller can hand it to an operator verbatim

pub mod handlers;
pub mod server;

pub use server::HttpServer;
