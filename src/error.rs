//! Error taxonomy for the transaction pipeline.
//!
//! Persistence errors are local to one request: they are recorded on the
//! active span, reflected in metric labels, and surfaced to the caller as
//! [`ProcessingFailed`] carrying the correlation id so traces and logs can
//! be joined. Telemetry emission never produces an error for callers.

use thiserror::Error;

use crate::telemetry::CorrelationId;

/// Errors raised by the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write was routed to a table that does not exist.
    ///
    /// This is the deliberate failure-injection path: a fraction of appends
    /// targets a missing table to exercise error telemetry end-to-end.
    #[error("persistence target not found: no such table '{table}'")]
    TargetNotFound { table: &'static str },

    /// Any other database failure.
    #[error("persistence I/O failure: {0}")]
    Io(#[from] sqlx::Error),
}

/// A business transaction that could not be completed.
///
/// Embeds the correlation id of the request's root span so the caller-visible
/// failure message can be joined against the trace and the error log line.
#[derive(Debug, Error)]
#[error("transaction processing failed (correlation_id: {correlation_id})")]
pub struct ProcessingFailed {
    pub correlation_id: CorrelationId,
    #[source]
    pub source: StoreError,
}

/// Errors raised while wiring telemetry exporters at startup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install OTLP trace pipeline: {0}")]
    Trace(#[from] opentelemetry::trace::TraceError),

    #[error("failed to install OTLP metrics pipeline: {0}")]
    Metrics(#[from] opentelemetry::metrics::MetricsError),

    #[error("failed to install Prometheus exporter: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_failed_embeds_correlation_id() {
        let err = ProcessingFailed {
            correlation_id: CorrelationId::from_string("abc123"),
            source: StoreError::TargetNotFound {
                table: "transactions_audit",
            },
        };
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn target_not_found_names_the_table() {
        let err = StoreError::TargetNotFound {
            table: "transactions_audit",
        };
        assert!(err.to_string().contains("transactions_audit"));
    }
}
