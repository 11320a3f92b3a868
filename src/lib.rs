//! Simulated transaction-processing service for observability validation.

pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod store;
pub mod telemetry;
pub mod workload;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use pipeline::PipelineContext;
pub use telemetry::{CorrelationId, Telemetry};
