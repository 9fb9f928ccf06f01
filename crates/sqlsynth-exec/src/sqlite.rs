//! SQLite connection backed by sqlx.

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite};
use sqlsynth_core::{BoxError, SqlValue};
use tracing::debug;

use crate::connection::{BatchConnection, QueryConnection};

type RawQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A pooled SQLite connection.
///
/// Closing it returns the connection to its pool.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: PoolConnection<Sqlite>,
}

impl SqliteConnection {
    /// Acquires a connection from `pool`.
    pub async fn acquire(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            conn: pool.acquire().await?,
        })
    }

    /// Runs a statement without parameters.
    async fn run(&mut self, sql: &str) -> Result<(), BoxError> {
        debug!(sql = %sql, "Executing SQL");
        sqlx::query(sql).execute(&mut *self.conn).await?;
        Ok(())
    }
}

impl From<PoolConnection<Sqlite>> for SqliteConnection {
    fn from(conn: PoolConnection<Sqlite>) -> Self {
        Self { conn }
    }
}

impl BatchConnection for SqliteConnection {
    async fn begin(&mut self) -> Result<(), BoxError> {
        self.run("BEGIN").await
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<u64, BoxError> {
        debug!(sql = %sql, rows = rows.len(), "Executing batch");
        let mut affected = 0;
        for row in rows {
            let result = bind_all(sqlx::query(sql), row)
                .execute(&mut *self.conn)
                .await?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }

    async fn commit(&mut self) -> Result<(), BoxError> {
        self.run("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), BoxError> {
        self.run("ROLLBACK").await
    }

    async fn close(self) -> Result<(), BoxError> {
        drop(self.conn);
        Ok(())
    }
}

impl QueryConnection for SqliteConnection {
    type Row = SqliteRow;

    async fn fetch_count(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, BoxError> {
        debug!(sql = %sql, "Counting rows");
        let row = bind_all(sqlx::query(sql), params)
            .fetch_one(&mut *self.conn)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(u64::try_from(count)?)
    }

    async fn fetch_rows(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<Self::Row>, BoxError> {
        debug!(sql = %sql, "Fetching rows");
        Ok(bind_all(sqlx::query(sql), params)
            .fetch_all(&mut *self.conn)
            .await?)
    }
}

fn bind_all<'q>(query: RawQuery<'q>, params: &[SqlValue]) -> RawQuery<'q> {
    params
        .iter()
        .cloned()
        .fold(query, bind_param)
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param(query: RawQuery<'_>, value: SqlValue) -> RawQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}
