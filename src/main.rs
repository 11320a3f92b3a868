//! pulsepay — a simulated transaction-processing service that exists to
//! emit realistic, correlated telemetry.
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   POST /process_   │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   transaction ─────┼─▶│  http  │──▶│ pipeline │──▶│   store    │  │
//!                    │  └────────┘   └────┬─────┘   └────────────┘  │
//!   GET /maintenance │                    │                         │
//!                    │                    ▼                         │
//!                    │  ┌─────────────────────────────────────────┐ │
//!                    │  │ telemetry (spans, metrics, correlation) │ │
//!                    │  │   otlp │ prometheus │ memory adapters   │ │
//!                    │  └─────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulsepay::config::{loader, AppConfig, ExporterKind};
use pulsepay::http::HttpServer;
use pulsepay::pipeline::PipelineContext;
use pulsepay::store::TransactionStore;
use pulsepay::telemetry::otlp::OtlpSink;
use pulsepay::telemetry::prom::{self, PromSink};
use pulsepay::telemetry::{Instruments, Telemetry, TelemetrySink};

#[derive(Parser)]
#[command(
    name = "pulsepay",
    about = "Simulated transaction service for validating observability pipelines"
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulsepay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => AppConfig::default(),
    };
    loader::apply_env_overrides(&mut config);

    tracing::info!(
        service_name = %config.observability.service_name,
        bind_address = %config.listener.bind_address,
        db_path = %config.persistence.db_path,
        exporter = ?config.observability.exporter,
        "Configuration loaded"
    );

    // Install the telemetry vendor adapter. The OTLP sink is kept as a
    // concrete handle too, so it can be flushed on shutdown.
    let mut otlp: Option<Arc<OtlpSink>> = None;
    let sink: Arc<dyn TelemetrySink> = match config.observability.exporter {
        ExporterKind::Otlp => {
            let installed = Arc::new(OtlpSink::install(
                &config.observability.service_name,
                &config.observability.otlp_endpoint,
            )?);
            otlp = Some(installed.clone());
            installed
        }
        ExporterKind::Prometheus => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => prom::init_metrics_exporter(addr)?,
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }
            Arc::new(PromSink::new())
        }
    };

    let telemetry = Telemetry::new(sink);
    let instruments = Instruments::new(telemetry.clone());
    let store = Arc::new(TransactionStore::open(Path::new(&config.persistence.db_path)).await?);

    let pipeline = PipelineContext {
        telemetry,
        instruments,
        store,
        tuning: config.simulation.clone(),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, pipeline);
    server.run(listener).await?;

    if let Some(sink) = otlp {
        sink.shutdown();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
