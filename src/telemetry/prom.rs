//! Prometheus-flavoured adapter.
//!
//! Spans become `tracing` spans (visible to the fmt subscriber and anything
//! layered on it), attributes and errors become structured events parented
//! to their span, and the business instruments go through the `metrics`
//! recorder, exposed on the Prometheus scrape endpoint installed at startup.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TelemetryError;
use crate::telemetry::instruments::{
    PROCESSING_DURATION_MS, TRANSACTIONS_TOTAL, TRANSACTION_VALUE,
};
use crate::telemetry::sink::{AttrValue, SpanId, TelemetrySink};
use crate::telemetry::CorrelationId;

/// Install the global `metrics` recorder with a Prometheus scrape listener.
pub fn init_metrics_exporter(addr: SocketAddr) -> Result<(), TelemetryError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

struct SpanEntry {
    span: tracing::Span,
    correlation_id: CorrelationId,
}

#[derive(Default)]
pub struct PromSink {
    spans: DashMap<u64, SpanEntry>,
    next_id: AtomicU64,
}

impl PromSink {
    pub fn new() -> Self {
        metrics::describe_counter!(
            TRANSACTIONS_TOTAL,
            "Total number of processed transactions"
        );
        metrics::describe_histogram!(
            TRANSACTION_VALUE,
            metrics::Unit::Count,
            "Value of processed transactions"
        );
        metrics::describe_histogram!(
            PROCESSING_DURATION_MS,
            metrics::Unit::Milliseconds,
            "Time taken for heavy processing tasks"
        );
        Self::default()
    }
}

fn label_set(labels: &[(&'static str, String)]) -> Vec<metrics::Label> {
    labels
        .iter()
        .map(|(key, value)| metrics::Label::new(*key, value.clone()))
        .collect()
}

impl TelemetrySink for PromSink {
    fn start_span(&self, name: &'static str, parent: Option<SpanId>) -> SpanId {
        let entry = match parent.and_then(|p| self.spans.get(&p.0)) {
            Some(parent_entry) => SpanEntry {
                span: tracing::info_span!(parent: &parent_entry.span, "pipeline", operation = name),
                correlation_id: parent_entry.correlation_id.clone(),
            },
            None => {
                let correlation_id = CorrelationId::generate();
                SpanEntry {
                    span: tracing::info_span!(
                        parent: None,
                        "pipeline",
                        operation = name,
                        correlation_id = %correlation_id,
                    ),
                    correlation_id,
                }
            }
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.spans.insert(id, entry);
        SpanId(id)
    }

    fn set_attribute(&self, span: SpanId, key: &'static str, value: AttrValue) {
        if let Some(entry) = self.spans.get(&span.0) {
            tracing::debug!(
                parent: &entry.span,
                attribute = key,
                value = %value,
                "span attribute"
            );
        }
    }

    fn record_error(&self, span: SpanId, error: &dyn Error) {
        if let Some(entry) = self.spans.get(&span.0) {
            tracing::error!(
                parent: &entry.span,
                correlation_id = %entry.correlation_id,
                error = %error,
                "span failed"
            );
        }
    }

    fn end_span(&self, span: SpanId) {
        // Dropping the tracing span closes it.
        self.spans.remove(&span.0);
    }

    fn correlation_id(&self, root: SpanId) -> CorrelationId {
        match self.spans.get(&root.0) {
            Some(entry) => entry.correlation_id.clone(),
            None => CorrelationId::generate(),
        }
    }

    fn add_counter(&self, name: &'static str, value: u64, labels: &[(&'static str, String)]) {
        metrics::counter!(name, label_set(labels)).increment(value);
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, String)]) {
        metrics::histogram!(name, label_set(labels)).record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_spans_get_distinct_correlation_ids() {
        let sink = PromSink::new();
        let a = sink.start_span("process_payment", None);
        let b = sink.start_span("process_payment", None);
        assert_ne!(sink.correlation_id(a), sink.correlation_id(b));
    }

    #[test]
    fn child_shares_root_correlation_id() {
        let sink = PromSink::new();
        let root = sink.start_span("process_payment", None);
        let child = sink.start_span("fraud_check", Some(root));
        assert_eq!(sink.correlation_id(child), sink.correlation_id(root));
    }

    #[test]
    fn ended_spans_are_forgotten() {
        let sink = PromSink::new();
        let root = sink.start_span("process_payment", None);
        sink.end_span(root);
        assert!(sink.spans.is_empty());
    }
}
