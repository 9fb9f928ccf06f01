//! Connection traits the executors run against.
//!
//! Errors cross these traits as [`BoxError`] so that any driver can be
//! plugged in; the executors attach the failing statement before returning
//! them to the caller.

use sqlsynth_core::{BoxError, SqlValue};

/// A connection able to run parameterized statements in explicit
/// transactions.
#[allow(async_fn_in_trait)]
pub trait BatchConnection {
    /// Starts a transaction.
    async fn begin(&mut self) -> Result<(), BoxError>;

    /// Runs `sql` once per parameter row and returns the affected row count.
    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<u64, BoxError>;

    /// Commits the current transaction.
    async fn commit(&mut self) -> Result<(), BoxError>;

    /// Rolls back the current transaction.
    async fn rollback(&mut self) -> Result<(), BoxError>;

    /// Releases the connection.
    async fn close(self) -> Result<(), BoxError>
    where
        Self: Sized;
}

/// A connection able to run row-returning queries.
#[allow(async_fn_in_trait)]
pub trait QueryConnection {
    /// The driver's row type.
    type Row;

    /// Runs a `SELECT COUNT(*)` query and returns the count.
    async fn fetch_count(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, BoxError>;

    /// Runs a query and returns every row.
    async fn fetch_rows(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<Self::Row>, BoxError>;
}
