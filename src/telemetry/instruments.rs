//! The fixed set of business instruments.
//!
//! Three instruments exist for the lifetime of the process; handlers record
//! against them at well-defined points and never observe aggregation or
//! export. Label assembly lives here so handler code stays free of metric
//! plumbing.

use crate::store::OutcomeStatus;
use crate::telemetry::Telemetry;

/// Monotonic count of processed transactions, by currency and outcome.
pub const TRANSACTIONS_TOTAL: &str = "transactions_total";

/// Distribution of transaction values in the transaction's currency unit.
pub const TRANSACTION_VALUE: &str = "transaction_value";

/// Distribution of heavy-processing durations in milliseconds.
pub const PROCESSING_DURATION_MS: &str = "processing_duration_ms";

/// Fire-and-forget recorder for the three business instruments.
#[derive(Clone)]
pub struct Instruments {
    telemetry: Telemetry,
}

impl Instruments {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }

    /// One transaction finished with the given outcome.
    pub fn transaction_recorded(&self, currency: &str, status: OutcomeStatus) {
        self.telemetry.sink().add_counter(
            TRANSACTIONS_TOTAL,
            1,
            &[
                ("currency", currency.to_string()),
                ("status", status.as_str().to_string()),
            ],
        );
    }

    /// Value of a successfully processed transaction.
    pub fn transaction_value(&self, amount: f64, currency: &str) {
        self.telemetry.sink().record_histogram(
            TRANSACTION_VALUE,
            amount,
            &[("currency", currency.to_string())],
        );
    }

    /// Wall-clock duration of one heavy processing task.
    pub fn processing_duration(&self, elapsed_ms: f64, task_type: &'static str) {
        self.telemetry.sink().record_histogram(
            PROCESSING_DURATION_MS,
            elapsed_ms,
            &[("task_type", task_type.to_string())],
        );
    }
}
