//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (service name, OTLP endpoint, db path)
//!     → semantic validation
//!     → AppConfig (immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the service runs with no config at all
//! - Environment variables win over the file, matching how the demo is
//!   deployed next to a collector
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{AppConfig, ExporterKind};
