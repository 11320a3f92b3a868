//! Request handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::http::server::AppState;
use crate::pipeline::{self, TransactionRequest};

/// Body of `POST /process_transaction`.
#[derive(Debug, Deserialize)]
pub struct TransactionBody {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    pub fail_rate: Option<f64>,
}

/// Simulate one business transaction.
pub async fn process_transaction(
    State(state): State<AppState>,
    Query(params): Query<TransactionParams>,
    Json(body): Json<TransactionBody>,
) -> Response {
    let fail_rate = params
        .fail_rate
        .unwrap_or(state.pipeline.tuning.default_fail_rate)
        .clamp(0.0, 1.0);
    let request = TransactionRequest {
        amount: body.amount,
        currency: body.currency,
    };

    match pipeline::process_transaction(&state.pipeline, &request, fail_rate).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": err.to_string(),
                "correlation_id": err.correlation_id,
            })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceParams {
    pub mult: Option<u32>,
}

const DEFAULT_MAINTENANCE_MULT: u32 = 5;

/// Generate CPU load for host-metrics correlation.
pub async fn maintenance(
    State(state): State<AppState>,
    Query(params): Query<MaintenanceParams>,
) -> Response {
    let mult = params.mult.unwrap_or(DEFAULT_MAINTENANCE_MULT);
    let report = pipeline::run_maintenance(&state.pipeline, mult).await;
    Json(report).into_response()
}

/// Liveness probe.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
