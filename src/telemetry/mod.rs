//! Telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline handlers
//!     → sink.rs (TelemetrySink trait, ScopedSpan guards)
//!     → one adapter, chosen at startup:
//!         otlp.rs (OpenTelemetry spans + OTLP metric reader)
//!         prom.rs (tracing spans + Prometheus scrape endpoint)
//!         memory.rs (in-process recording, tests)
//!
//! instruments.rs wraps the sink's metric methods behind the three
//! fixed business instruments.
//! ```
//!
//! # Design Decisions
//! - The pipeline is written once against `TelemetrySink`; vendors are
//!   adapters, never a second copy of the pipeline
//! - Span context is carried by owned guards passed down the call chain,
//!   never a process-global "active span" variable
//! - A span is closed exactly once, on guard drop, including error paths
//! - Metric recording is fire-and-forget; export failures stay inside the
//!   adapter

pub mod instruments;
pub mod memory;
pub mod otlp;
pub mod prom;
pub mod sink;

pub use instruments::Instruments;
pub use sink::{AttrValue, ScopedSpan, SpanId, Telemetry, TelemetrySink};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier joining one request's trace with its log lines and its
/// HTTP response.
///
/// Derived deterministically from the root span of a request: the OTLP
/// adapter uses the trace id, the others mint a uuid when the root span is
/// created. Stable for the lifetime of that request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mint a fresh random correlation id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an identifier produced elsewhere (e.g. a trace id).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn from_string_round_trips() {
        let id = CorrelationId::from_string("4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(id.as_str(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
    }
}
