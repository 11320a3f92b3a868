//! OpenTelemetry adapter shipping spans and metrics over OTLP.
//!
//! Spans are kept in a shared table keyed by the sink-assigned span id; the
//! guard layer guarantees each entry is ended exactly once. The correlation
//! id handed back to callers is the trace id, so responses and log lines
//! join against the tracing backend directly.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use opentelemetry::metrics::{Counter, Histogram, Meter, Unit};
use opentelemetry::trace::{Status, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_sdk::Resource;

use crate::error::TelemetryError;
use crate::telemetry::instruments::{
    PROCESSING_DURATION_MS, TRANSACTIONS_TOTAL, TRANSACTION_VALUE,
};
use crate::telemetry::sink::{AttrValue, SpanId, TelemetrySink};
use crate::telemetry::CorrelationId;

const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

pub struct OtlpSink {
    tracer: sdktrace::Tracer,
    meter: Meter,
    meter_provider: SdkMeterProvider,
    spans: DashMap<u64, Context>,
    counters: DashMap<&'static str, Counter<u64>>,
    histograms: DashMap<&'static str, Histogram<f64>>,
    next_id: AtomicU64,
}

impl OtlpSink {
    /// Build the OTLP trace and metric pipelines and register them as the
    /// process-global providers. Must run inside a tokio runtime.
    pub fn install(service_name: &str, endpoint: &str) -> Result<Self, TelemetryError> {
        let resource = Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]);

        let span_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint.to_string())
            .build_span_exporter()?;
        let span_processor =
            sdktrace::BatchSpanProcessor::builder(span_exporter, opentelemetry_sdk::runtime::Tokio)
                .build();
        let tracer_provider = sdktrace::TracerProvider::builder()
            .with_config(
                sdktrace::config()
                    .with_resource(resource.clone())
                    .with_sampler(sdktrace::Sampler::AlwaysOn),
            )
            .with_span_processor(span_processor)
            .build();
        global::set_tracer_provider(tracer_provider.clone());
        let tracer = tracer_provider.tracer("pulsepay");

        let meter_provider = opentelemetry_otlp::new_pipeline()
            .metrics(opentelemetry_sdk::runtime::Tokio)
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint.to_string()),
            )
            .with_resource(resource)
            .with_period(METRIC_EXPORT_INTERVAL)
            .build()?;
        global::set_meter_provider(meter_provider.clone());
        let meter = global::meter("pulsepay");

        Ok(Self {
            tracer,
            meter,
            meter_provider,
            spans: DashMap::new(),
            counters: DashMap::new(),
            histograms: DashMap::new(),
            next_id: AtomicU64::new(0),
        })
    }

    /// Flush pending telemetry and tear down the global providers.
    pub fn shutdown(&self) {
        global::shutdown_tracer_provider();
        if let Err(err) = self.meter_provider.shutdown() {
            tracing::warn!(error = %err, "OTLP meter provider shutdown failed");
        }
    }

    fn counter(&self, name: &'static str) -> Counter<u64> {
        self.counters
            .entry(name)
            .or_insert_with(|| {
                let builder = self.meter.u64_counter(name);
                let builder = match name {
                    TRANSACTIONS_TOTAL => builder
                        .with_unit(Unit::new("1"))
                        .with_description("Total number of processed transactions"),
                    _ => builder,
                };
                builder.init()
            })
            .value()
            .clone()
    }

    fn histogram(&self, name: &'static str) -> Histogram<f64> {
        self.histograms
            .entry(name)
            .or_insert_with(|| {
                let builder = self.meter.f64_histogram(name);
                let builder = match name {
                    TRANSACTION_VALUE => builder
                        .with_unit(Unit::new("EUR"))
                        .with_description("Value of processed transactions"),
                    PROCESSING_DURATION_MS => builder
                        .with_unit(Unit::new("ms"))
                        .with_description("Time taken for heavy processing tasks"),
                    _ => builder,
                };
                builder.init()
            })
            .value()
            .clone()
    }
}

fn otel_value(value: AttrValue) -> opentelemetry::Value {
    match value {
        AttrValue::Str(v) => opentelemetry::Value::String(v.into()),
        AttrValue::I64(v) => opentelemetry::Value::I64(v),
        AttrValue::F64(v) => opentelemetry::Value::F64(v),
        AttrValue::Bool(v) => opentelemetry::Value::Bool(v),
    }
}

fn attribute_set(labels: &[(&'static str, String)]) -> Vec<KeyValue> {
    labels
        .iter()
        .map(|(key, value)| KeyValue::new(*key, value.clone()))
        .collect()
}

impl TelemetrySink for OtlpSink {
    fn start_span(&self, name: &'static str, parent: Option<SpanId>) -> SpanId {
        let parent_cx = parent
            .and_then(|p| self.spans.get(&p.0).map(|entry| entry.value().clone()))
            .unwrap_or_else(Context::new);
        let span = self.tracer.start_with_context(name, &parent_cx);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.spans.insert(id, parent_cx.with_span(span));
        SpanId(id)
    }

    fn set_attribute(&self, span: SpanId, key: &'static str, value: AttrValue) {
        if let Some(cx) = self.spans.get(&span.0) {
            cx.span().set_attribute(KeyValue::new(key, otel_value(value)));
        }
    }

    fn record_error(&self, span: SpanId, error: &dyn Error) {
        if let Some(cx) = self.spans.get(&span.0) {
            let span = cx.span();
            span.record_error(error);
            span.set_status(Status::error(error.to_string()));
        }
    }

    fn end_span(&self, span: SpanId) {
        if let Some((_, cx)) = self.spans.remove(&span.0) {
            cx.span().end();
        }
    }

    fn correlation_id(&self, root: SpanId) -> CorrelationId {
        match self.spans.get(&root.0) {
            Some(cx) => {
                CorrelationId::from_string(cx.span().span_context().trace_id().to_string())
            }
            None => CorrelationId::generate(),
        }
    }

    fn add_counter(&self, name: &'static str, value: u64, labels: &[(&'static str, String)]) {
        self.counter(name).add(value, &attribute_set(labels));
    }

    fn record_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, String)]) {
        self.histogram(name).record(value, &attribute_set(labels));
    }
}
