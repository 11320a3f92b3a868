//! Request pipeline orchestration.
//!
//! # Data Flow
//! ```text
//! http handler
//!     → transaction.rs (process_payment span tree, store append, metrics)
//!     → maintenance.rs (system_maintenance span, sort load, metrics)
//!
//! Both drive:
//!     → telemetry (spans, correlation ids)
//!     → instruments (business metrics)
//!     → workload (CPU burn)
//!     → store (transaction.rs only)
//! ```
//!
//! # Design Decisions
//! - HTTP-free: handlers take a context and typed request values, return
//!   typed results; axum glue lives in `http`
//! - Span context flows through owned guards, so concurrent requests never
//!   share active-span state
//! - The store's failure injection is surfaced as a typed error carrying the
//!   correlation id, never as a thrown-and-caught control flow

pub mod maintenance;
pub mod transaction;

pub use maintenance::{run_maintenance, MaintenanceReport};
pub use transaction::{process_transaction, TransactionReceipt, TransactionRequest};

use std::sync::Arc;

use crate::config::schema::SimulationConfig;
use crate::store::TransactionStore;
use crate::telemetry::{Instruments, Telemetry};

/// Shared, process-wide collaborators handed to every request.
#[derive(Clone)]
pub struct PipelineContext {
    pub telemetry: Telemetry,
    pub instruments: Instruments,
    pub store: Arc<TransactionStore>,
    pub tuning: SimulationConfig,
}
