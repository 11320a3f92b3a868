//! Persistence gateway.
//!
//! # Data Flow
//! ```text
//! pipeline handler
//!     → append() — one row per transaction outcome
//!     → sqlite pool (shared across requests, each append atomic)
//! ```
//!
//! # Design Decisions
//! - Append-only: rows are never updated or deleted
//! - Failure injection keeps its table-not-found character: a fraction of
//!   appends is routed to a table that does not exist, yielding a
//!   deterministic `TargetNotFound` rather than a synthetic random error
//! - No cross-request transaction coordination

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;

/// The real append target.
const TRANSACTIONS_TABLE: &str = "transactions";

/// The injected append target. Never created on purpose: writes routed here
/// fail with "no such table", exercising the error-telemetry path.
const INJECTED_TABLE: &str = "transactions_audit";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS transactions \
    (id INTEGER PRIMARY KEY, amount REAL, currency TEXT, status TEXT)";

/// Outcome of one business transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failure,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "SUCCESS",
            OutcomeStatus::Failure => "FAILURE",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "SUCCESS" => OutcomeStatus::Success,
            _ => OutcomeStatus::Failure,
        }
    }
}

/// Row identifier assigned by the store on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

/// One transaction outcome as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub amount: f64,
    pub currency: String,
    pub status: OutcomeStatus,
}

/// Handle to the append-only transaction log.
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    /// Open (creating if necessary) the record store at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Append one outcome record.
    ///
    /// With probability `inject_target_not_found` the write is routed to a
    /// table that does not exist, producing [`StoreError::TargetNotFound`].
    /// The injection draw is independent of the normal write path.
    pub async fn append(
        &self,
        record: &TransactionRecord,
        inject_target_not_found: f64,
    ) -> Result<RecordId, StoreError> {
        let table = if fastrand::f64() < inject_target_not_found {
            INJECTED_TABLE
        } else {
            TRANSACTIONS_TABLE
        };
        let sql = format!("INSERT INTO {table} (amount, currency, status) VALUES (?, ?, ?)");
        let result = sqlx::query(&sql)
            .bind(record.amount)
            .bind(&record.currency)
            .bind(record.status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| classify(err, table))?;
        Ok(RecordId(result.last_insert_rowid()))
    }

    /// Read back one appended record.
    pub async fn fetch(&self, id: RecordId) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query("SELECT amount, currency, status FROM transactions WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| TransactionRecord {
            amount: row.get(0),
            currency: row.get(1),
            status: OutcomeStatus::parse(&row.get::<String, _>(2)),
        }))
    }
}

/// Distinguish the injected missing-table failure from genuine I/O trouble.
fn classify(err: sqlx::Error, table: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.message().contains("no such table") {
            return StoreError::TargetNotFound { table };
        }
    }
    StoreError::Io(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_store() -> (TransactionStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::open(&dir.path().join("txn.db"))
            .await
            .unwrap();
        (store, dir)
    }

    fn record() -> TransactionRecord {
        TransactionRecord {
            amount: 100.0,
            currency: "EUR".to_string(),
            status: OutcomeStatus::Success,
        }
    }

    #[tokio::test]
    async fn append_then_fetch_round_trips() {
        let (store, _dir) = scratch_store().await;
        let id = store.append(&record(), 0.0).await.unwrap();
        let fetched = store.fetch(id).await.unwrap().unwrap();
        assert_eq!(fetched, record());
    }

    #[tokio::test]
    async fn full_injection_always_hits_the_missing_table() {
        let (store, _dir) = scratch_store().await;
        for _ in 0..10 {
            let err = store.append(&record(), 1.0).await.unwrap_err();
            match err {
                StoreError::TargetNotFound { table } => assert_eq!(table, "transactions_audit"),
                other => panic!("expected TargetNotFound, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn zero_injection_never_fails() {
        let (store, _dir) = scratch_store().await;
        for _ in 0..10 {
            store.append(&record(), 0.0).await.unwrap();
        }
    }

    #[tokio::test]
    async fn injected_failures_leave_no_rows_behind() {
        let (store, _dir) = scratch_store().await;
        let id = store.append(&record(), 0.0).await.unwrap();
        let _ = store.append(&record(), 1.0).await;
        // Only the successful append is visible.
        assert!(store.fetch(id).await.unwrap().is_some());
        assert!(store.fetch(RecordId(id.0 + 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_unknown_id_is_none() {
        let (store, _dir) = scratch_store().await;
        assert!(store.fetch(RecordId(999)).await.unwrap().is_none());
    }
}
