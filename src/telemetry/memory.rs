//! In-process recording sink.
//!
//! Captures every span, attribute, error, and metric sample so tests can
//! assert on exactly what the pipeline emitted. Doubles as proof that the
//! pipeline core is vendor-agnostic.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::telemetry::sink::{AttrValue, SpanId, TelemetrySink};
use crate::telemetry::CorrelationId;

/// Everything the sink ever learned about one span.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub id: SpanId,
    pub name: &'static str,
    pub parent: Option<SpanId>,
    pub correlation_id: CorrelationId,
    pub attributes: Vec<(&'static str, AttrValue)>,
    pub error: Option<String>,
    pub close_count: u32,
}

impl SpanRecord {
    pub fn is_closed(&self) -> bool {
        self.close_count > 0
    }
}

/// Which instrument family a sample was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Counter,
    Histogram,
}

/// One immutable metric sample.
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub kind: SampleKind,
    pub name: &'static str,
    pub value: f64,
    pub labels: Vec<(&'static str, String)>,
}

impl MetricSample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
pub struct MemorySink {
    next_id: AtomicU64,
    spans: Mutex<Vec<SpanRecord>>,
    samples: Mutex<Vec<MetricSample>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans in creation order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().unwrap().clone()
    }

    /// Root spans only, in creation order.
    pub fn root_spans(&self) -> Vec<SpanRecord> {
        self.spans()
            .into_iter()
            .filter(|s| s.parent.is_none())
            .collect()
    }

    pub fn open_span_count(&self) -> usize {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }

    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn samples_for(&self, name: &str) -> Vec<MetricSample> {
        self.samples()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    fn with_span<R>(&self, span: SpanId, f: impl FnOnce(&mut SpanRecord) -> R) -> Option<R> {
        let mut spans = self.spans.lock().unwrap();
        spans.iter_mut().find(|s| s.id == span).map(f)
    }
}

impl TelemetrySink for MemorySink {
    fn start_span(&self, name: &'static str, parent: Option<SpanId>) -> SpanId {
        let id = SpanId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let correlation_id = match parent {
            Some(parent_id) => self
                .with_span(parent_id, |p| p.correlation_id.clone())
                .unwrap_or_else(CorrelationId::generate),
            None => CorrelationId::generate(),
        };
        self.spans.lock().unwrap().push(SpanRecord {
            id,
            name,
            parent,
            correlation_id,
            attributes: Vec::new(),
            error: None,
            close_count: 0,
        });
        id
    }

    fn set_attribute(&self, span: SpanId, key: &'static str, value: AttrValue) {
        let known = self.with_span(span, |s| {
            debug_assert!(!s.is_closed(), "attribute set on closed span {key}");
            s.attributes.push((key, value));
        });
        debug_assert!(known.is_some(), "attribute set on unknown span");
    }

    fn record_error(&self, span: SpanId, error: &dyn Error) {
        self.with_span(span, |s| s.error = Some(error.to_string()));
    }

    fn end_span(&self, span: SpanId) {
        self.with_span(span, |s| s.close_count += 1);
    }

    fn correlation_id(&self, root: SpanId) -> CorrelationId {
        self.with_span(root, |s| s.correlation_id.clone())
            .unwrap_or_else(CorrelationId::generate)
    }

    fn add_counter(&self, name: &'static str, value: u64, labels: &[(&'static str, String)]) {
        self.samples.lock().unwrap().push(MetricSample {
            kind: SampleKind::Counter,
            name,
            value: value as f64,
            labels: labels.to_vec(),
        });
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, String)]) {
        self.samples.lock().unwrap().push(MetricSample {
            kind: SampleKind::Histogram,
            name,
            value,
            labels: labels.to_vec(),
        });
    }
}
