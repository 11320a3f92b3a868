//! The sink abstraction the pipeline emits telemetry through.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::telemetry::CorrelationId;

/// Adapter-assigned handle for one open span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub(crate) u64);

/// Attribute value attached to a span.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(v) => write!(f, "{v}"),
            AttrValue::I64(v) => write!(f, "{v}"),
            AttrValue::F64(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::I64(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::I64(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::F64(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

/// Vendor-neutral telemetry capability.
///
/// One implementation is installed per process; the pipeline only ever talks
/// to this trait. Every method is fire-and-forget from the caller's point of
/// view: an adapter that fails to export must swallow or retry internally.
pub trait TelemetrySink: Send + Sync {
    /// Open a span. `parent` is `None` for a request's root span.
    fn start_span(&self, name: &'static str, parent: Option<SpanId>) -> SpanId;

    /// Attach metadata to an open span.
    fn set_attribute(&self, span: SpanId, key: &'static str, value: AttrValue);

    /// Mark an open span as failed and attach error detail. Last write wins
    /// when called more than once.
    fn record_error(&self, span: SpanId, error: &dyn Error);

    /// Close a span. Adapters may assume each span id is ended at most once;
    /// the [`ScopedSpan`] guard enforces that.
    fn end_span(&self, span: SpanId);

    /// The correlation identifier derived from a request's root span.
    /// Available from the moment the root span is created.
    fn correlation_id(&self, root: SpanId) -> CorrelationId;

    /// Add to a monotonic counter.
    fn add_counter(&self, name: &'static str, value: u64, labels: &[(&'static str, String)]);

    /// Record one sample into a distribution.
    fn record_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, String)]);
}

/// Cloneable entry point handed to every request handler.
#[derive(Clone)]
pub struct Telemetry {
    sink: Arc<dyn TelemetrySink>,
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    /// Open the root span for one request and return its owning guard.
    pub fn root_span(&self, name: &'static str) -> ScopedSpan {
        let id = self.sink.start_span(name, None);
        ScopedSpan {
            sink: Arc::clone(&self.sink),
            id,
            root: id,
            closed: false,
        }
    }

    pub(crate) fn sink(&self) -> &Arc<dyn TelemetrySink> {
        &self.sink
    }
}

/// Owning guard for one open span.
///
/// The span is closed exactly once: either by an explicit [`end`](Self::end)
/// or when the guard drops, which also covers early returns and unwinds.
/// Mutation after close is unrepresentable because closing consumes the
/// guard.
pub struct ScopedSpan {
    sink: Arc<dyn TelemetrySink>,
    id: SpanId,
    root: SpanId,
    closed: bool,
}

impl ScopedSpan {
    /// Open a child span. The child shares the root's correlation id.
    pub fn child(&self, name: &'static str) -> ScopedSpan {
        let id = self.sink.start_span(name, Some(self.id));
        ScopedSpan {
            sink: Arc::clone(&self.sink),
            id,
            root: self.root,
            closed: false,
        }
    }

    pub fn set_attribute(&self, key: &'static str, value: impl Into<AttrValue>) {
        self.sink.set_attribute(self.id, key, value.into());
    }

    /// Mark this span as failed. Idempotent; the last recorded error wins.
    pub fn record_error(&self, error: &dyn Error) {
        self.sink.record_error(self.id, error);
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.sink.correlation_id(self.root)
    }

    /// Close the span now instead of at end of scope.
    pub fn end(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.end_span(self.id);
        }
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::memory::MemorySink;

    fn telemetry() -> (Telemetry, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Telemetry::new(sink.clone()), sink)
    }

    #[test]
    fn root_span_closes_on_drop() {
        let (telemetry, sink) = telemetry();
        {
            let _root = telemetry.root_span("request");
            assert_eq!(sink.open_span_count(), 1);
        }
        assert_eq!(sink.open_span_count(), 0);
        assert_eq!(sink.spans()[0].close_count, 1);
    }

    #[test]
    fn explicit_end_does_not_double_close() {
        let (telemetry, sink) = telemetry();
        let root = telemetry.root_span("request");
        root.end();
        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].close_count, 1);
    }

    #[test]
    fn span_closes_even_when_scope_unwinds() {
        let (telemetry, sink) = telemetry();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _root = telemetry.root_span("request");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(sink.open_span_count(), 0);
        assert_eq!(sink.spans()[0].close_count, 1);
    }

    #[test]
    fn child_spans_link_to_parent_and_share_correlation() {
        let (telemetry, sink) = telemetry();
        let root = telemetry.root_span("request");
        let root_correlation = root.correlation_id();
        let child = root.child("step");
        assert_eq!(child.correlation_id(), root_correlation);
        child.end();
        root.end();

        let spans = sink.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].parent, Some(spans[0].id));
    }

    #[test]
    fn correlation_id_is_stable_for_the_request() {
        let (telemetry, _sink) = telemetry();
        let root = telemetry.root_span("request");
        assert_eq!(root.correlation_id(), root.correlation_id());
    }

    #[test]
    fn attributes_and_errors_reach_the_sink() {
        let (telemetry, sink) = telemetry();
        let root = telemetry.root_span("request");
        root.set_attribute("transaction.amount", 100.0);
        root.set_attribute("transaction.currency", "EUR");
        let err = std::io::Error::other("disk on fire");
        root.record_error(&err);
        root.end();

        let span = &sink.spans()[0];
        assert_eq!(
            span.attributes,
            vec![
                ("transaction.amount", AttrValue::F64(100.0)),
                ("transaction.currency", AttrValue::Str("EUR".into())),
            ]
        );
        assert_eq!(span.error.as_deref(), Some("disk on fire"));
    }
}
