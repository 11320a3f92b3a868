//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Observability settings (telemetry vendor, endpoints, log level).
    pub observability: ObservabilityConfig,

    /// Record store location.
    pub persistence: PersistenceConfig,

    /// Simulated workload tuning.
    pub simulation: SimulationConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which telemetry vendor adapter to install at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    /// OpenTelemetry spans and metrics shipped over OTLP/gRPC.
    Otlp,
    /// tracing spans plus a Prometheus scrape endpoint.
    #[default]
    Prometheus,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Resource-level service name attached to all telemetry.
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Telemetry vendor adapter.
    pub exporter: ExporterKind,

    /// OTLP collector endpoint (exporter = "otlp").
    pub otlp_endpoint: String,

    /// Enable the Prometheus scrape endpoint (exporter = "prometheus").
    pub metrics_enabled: bool,

    /// Prometheus scrape endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "pulsepay".to_string(),
            log_level: "info".to_string(),
            exporter: ExporterKind::default(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Path of the sqlite record store.
    pub db_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_path: "./pulsepay.db".to_string(),
        }
    }
}

/// Simulated workload tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Busy-loop iterations for the fraud-check stand-in.
    pub fraud_check_intensity: u64,

    /// Injection probability used when the caller omits `fail_rate`.
    pub default_fail_rate: f64,

    /// Values generated per unit of maintenance intensity.
    pub maintenance_chunk: usize,

    /// Upper bound on the `mult` query parameter.
    pub max_maintenance_mult: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fraud_check_intensity: 500_000,
            default_fail_rate: 0.3,
            maintenance_chunk: 100_000,
            max_maintenance_mult: 64,
        }
    }
}
