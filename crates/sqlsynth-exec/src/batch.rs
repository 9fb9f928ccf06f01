//! Chunked batch execution.

use sqlsynth_core::statement::GeneratedStatement;
use sqlsynth_core::{BoxError, Entity, Error, Result, SqlValue};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::connection::BatchConnection;

/// Runs one statement over many parameter rows, committing every
/// `chunk_size` rows.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    chunk_size: usize,
}

impl BatchExecutor {
    /// Creates an executor committing every `chunk_size` rows.
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    /// Creates an executor from configuration.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        Self::new(config.chunk_size)
    }

    /// Returns the number of rows per transaction.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Runs `sql` over `rows`. See [`run_batches`].
    pub async fn run<C: BatchConnection>(
        &self,
        conn: C,
        sql: &str,
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        run_batches(conn, sql, rows, self.chunk_size).await
    }

    /// Binds `statement` to each entity and runs the result.
    pub async fn execute<C, E>(
        &self,
        conn: C,
        statement: &GeneratedStatement,
        entities: &[E],
    ) -> Result<u64>
    where
        C: BatchConnection,
        E: Entity,
    {
        let rows = match entities
            .iter()
            .map(|entity| statement.bind(entity))
            .collect::<Result<Vec<_>>>()
        {
            Ok(rows) => rows,
            Err(err) => {
                release(conn).await;
                return Err(err);
            }
        };
        self.run(conn, statement.sql(), &rows).await
    }
}

/// Runs `sql` once per row of `rows`, `chunk_size` rows per transaction.
///
/// Chunks run in row order and each is committed before the next starts.
/// When a chunk fails, its transaction is rolled back and the driver error
/// is returned with the statement text; earlier chunks stay committed. The
/// connection is closed on every path.
pub async fn run_batches<C: BatchConnection>(
    mut conn: C,
    sql: &str,
    rows: &[Vec<SqlValue>],
    chunk_size: usize,
) -> Result<u64> {
    let outcome = run_chunks(&mut conn, sql, rows, chunk_size).await;
    release(conn).await;
    outcome
}

async fn run_chunks<C: BatchConnection>(
    conn: &mut C,
    sql: &str,
    rows: &[Vec<SqlValue>],
    chunk_size: usize,
) -> Result<u64> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize);
    }

    let mut affected = 0;
    let mut chunks = 0_usize;
    for (index, chunk) in rows.chunks(chunk_size).enumerate() {
        match run_chunk(conn, sql, chunk).await {
            Ok(count) => {
                debug!(chunk = index, rows = chunk.len(), affected = count, "Committed chunk");
                affected += count;
                chunks += 1;
            }
            Err(source) => {
                if let Err(rollback) = conn.rollback().await {
                    warn!(chunk = index, error = %rollback, "Rollback failed");
                }
                return Err(Error::execution(sql, source));
            }
        }
    }

    info!(
        sql = %sql,
        rows = rows.len(),
        chunks,
        affected,
        "Batch completed"
    );
    Ok(affected)
}

async fn run_chunk<C: BatchConnection>(
    conn: &mut C,
    sql: &str,
    chunk: &[Vec<SqlValue>],
) -> std::result::Result<u64, BoxError> {
    conn.begin().await?;
    let count = conn.execute_batch(sql, chunk).await?;
    conn.commit().await?;
    Ok(count)
}

async fn release<C: BatchConnection>(conn: C) {
    if let Err(err) = conn.close().await {
        warn!(error = %err, "Failed to release connection");
    }
}
