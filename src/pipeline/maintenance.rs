//! The maintenance handler: load generation for host-metrics correlation.

use serde::Serialize;

use crate::pipeline::PipelineContext;
use crate::workload;

/// Result of one maintenance pass.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub status: &'static str,
    pub duration_ms: f64,
}

/// Generate and sort `mult * maintenance_chunk` random values under a root
/// span, recording the elapsed time as a processing-duration sample.
///
/// No recoverable failure path: anything that stops the sort is resource
/// exhaustion and fatal by design. `mult` is clamped to the configured
/// maximum so a stray query parameter cannot exhaust memory.
pub async fn run_maintenance(ctx: &PipelineContext, mult: u32) -> MaintenanceReport {
    let mult = mult.clamp(1, ctx.tuning.max_maintenance_mult);
    let root = ctx.telemetry.root_span("system_maintenance");
    root.set_attribute("maintenance.intensity", mult);
    tracing::warn!(
        correlation_id = %root.correlation_id(),
        intensity = mult,
        "Starting high-intensity maintenance task"
    );

    let elapsed = workload::random_sort(mult as usize * ctx.tuning.maintenance_chunk);
    let duration_ms = elapsed.as_secs_f64() * 1000.0;
    ctx.instruments.processing_duration(duration_ms, "sort");

    tracing::info!(duration_ms, "Maintenance finished");
    MaintenanceReport {
        status: "done",
        duration_ms,
    }
}
