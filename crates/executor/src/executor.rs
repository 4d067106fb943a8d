//! The Executor - single entry point for batches.
//!
//! The Executor validates a batch, runs it inside one atomic unit of the
//! database and classifies the result into a [`BatchOutcome`].

use std::sync::Arc;
use std::time::Duration;

use mopstore_core::{Mop, MopKind, MopResult, Row, StoreError, StoreResult, TableKind, Value};
use mopstore_engine::{Database, StoreProperties, TransactionContext};
use tracing::{debug, warn};

use crate::convert::convert_result;
use crate::outcome::classify;
use crate::validate::validate_batch;
use crate::{BatchOutcome, BatchRequest, Response, Result};

/// The batch executor.
///
/// The Executor holds a reference to the database and no state of its own.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads. Batches from
/// different threads serialize on the database's writer lock.
///
/// # Example
///
/// ```text
/// let executor = Executor::new(Database::ephemeral());
/// let outcome = executor.execute_batch(
///     TableKind::Append,
///     &[Mop::read(1), Mop::append(1, "x"), Mop::read(1)],
/// )?;
/// assert!(outcome.is_ok());
/// ```
pub struct Executor {
    db: Arc<Database>,
    busy_timeout: Option<Duration>,
}

impl Executor {
    /// Create a new executor over a database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            busy_timeout: None,
        }
    }

    /// Override the database's busy timeout for batches run by this executor.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// The underlying database
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Writer-lock timeout applied to each batch
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout.unwrap_or_else(|| self.db.busy_timeout())
    }

    /// Execute one batch against `table`.
    ///
    /// Returns `Err` only for validation failures, in which case the store
    /// was never touched. Every failure after the atomic unit began is
    /// reported as [`BatchOutcome::Info`].
    pub fn execute_batch(&self, table: TableKind, ops: &[Mop]) -> Result<BatchOutcome> {
        validate_batch(table, ops)?;

        let result = self
            .db
            .transaction_with_timeout(self.busy_timeout(), |txn| run_batch(txn, table, ops))
            .map(|(results, version)| {
                debug!(target: "mopstore::executor", %table, ops = ops.len(), version, "Batch committed");
                results
            });

        let outcome = classify(convert_result(result));
        if let BatchOutcome::Info { error } = &outcome {
            warn!(target: "mopstore::executor", %table, ops = ops.len(), %error, "Batch outcome unknown");
        }
        Ok(outcome)
    }

    /// Execute a request in its wire shape.
    pub fn execute_request(&self, request: &BatchRequest) -> Result<BatchOutcome> {
        self.execute_batch(request.table, &request.value)
    }

    /// Parse and execute one request line, producing the response line.
    ///
    /// Malformed lines and validation failures become `fail`.
    pub fn handle_line(&self, line: &str) -> Response {
        match BatchRequest::from_json(line) {
            Ok(request) => self.execute_request(&request).into(),
            Err(error) => {
                debug!(target: "mopstore::executor", %error, "Request rejected");
                Response::fail(error)
            }
        }
    }

    /// Every committed row of `table`.
    pub fn list(&self, table: TableKind) -> Result<Vec<Row>> {
        convert_result(self.db.list(table))
    }

    /// Properties report of the underlying database.
    pub fn properties(&self) -> StoreProperties {
        self.db.properties()
    }
}

/// Apply each operation in order inside the open unit.
fn run_batch(txn: &mut TransactionContext, table: TableKind, ops: &[Mop]) -> StoreResult<Vec<MopResult>> {
    let mut results = Vec::with_capacity(ops.len());
    for mop in ops {
        let result = match mop.f {
            MopKind::Read => MopResult::read(mop.k, txn.get(table, mop.k)?),
            MopKind::Write => {
                let affected = txn.put_overwrite(table, mop.k, operand(mop)?)?;
                expect_one_row(mop, affected)?;
                MopResult::echo(mop)
            }
            MopKind::Append if table == TableKind::Set => {
                txn.insert_set_member(table, mop.id, mop.k, operand(mop)?)?;
                MopResult::echo(mop)
            }
            MopKind::Append => {
                let affected = txn.put_merge(table, mop.k, operand(mop)?)?;
                expect_one_row(mop, affected)?;
                MopResult::echo(mop)
            }
        };
        results.push(result);
    }
    Ok(results)
}

fn operand(mop: &Mop) -> StoreResult<Value> {
    mop.v.clone().ok_or_else(|| {
        StoreError::invalid_input(format!("'{}' of key {} is missing a value", mop.f, mop.k))
    })
}

/// Register upserts always report one row; any other count is a store defect.
fn expect_one_row(mop: &Mop, affected: usize) -> StoreResult<()> {
    if affected == 1 {
        Ok(())
    } else {
        Err(StoreError::constraint(format!(
            "'{}' of key {} affected {} rows, expected 1",
            mop.f, mop.k, affected
        )))
    }
}
