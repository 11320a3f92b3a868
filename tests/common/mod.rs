//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use pulsepay::config::AppConfig;
use pulsepay::http::HttpServer;
use pulsepay::pipeline::PipelineContext;
use pulsepay::store::TransactionStore;
use pulsepay::telemetry::memory::MemorySink;
use pulsepay::telemetry::{Instruments, Telemetry};

/// A running service instance backed by the recording sink and a scratch
/// database, reachable at `addr`.
pub struct TestApp {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

/// Spin up the full HTTP stack on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let db_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        TransactionStore::open(&db_dir.path().join("txn.db"))
            .await
            .unwrap(),
    );
    let sink = Arc::new(MemorySink::new());
    let telemetry = Telemetry::new(sink.clone());

    let mut config = AppConfig::default();
    // Keep the burn short; these tests assert on telemetry, not on load.
    config.simulation.fraud_check_intensity = 10_000;
    config.simulation.maintenance_chunk = 10_000;

    let pipeline = PipelineContext {
        instruments: Instruments::new(telemetry.clone()),
        telemetry,
        store,
        tuning: config.simulation.clone(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, pipeline);

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    TestApp {
        addr,
        sink,
        _db_dir: db_dir,
    }
}
