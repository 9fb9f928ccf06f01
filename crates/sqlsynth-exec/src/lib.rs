//! Batch and page execution for sqlsynth statements.
//!
//! `sqlsynth-exec` runs what `sqlsynth-core` synthesizes:
//!
//! - **Batch executor** - Runs one statement over many parameter rows,
//!   committing every `chunk_size` rows and rolling back the failing chunk
//! - **Page executor** - Runs the count and page queries of a paginated
//!   SELECT and assembles a [`PageResult`](sqlsynth_core::PageResult)
//! - **Connections** - Driver-neutral traits, with a sqlx-backed SQLite
//!   implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlsynth_core::{DialectKind, StatementSynthesizer, TemplateKind, WritePolicy};
//! use sqlsynth_exec::prelude::*;
//!
//! let synth = StatementSynthesizer::new(DialectKind::Sqlite.dialect());
//! let stmt = synth.template::<Staff>(&TemplateKind::Merge(WritePolicy::soft()))?;
//!
//! let conn = SqliteConnection::acquire(&pool).await?;
//! let saved = BatchExecutor::new(500)?.execute(conn, &stmt, &staff).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Show the clause offsets of a query
//! sqlsynth scan "SELECT * FROM t ORDER BY id"
//!
//! # Show the count and page queries for page 2 of 10 rows
//! sqlsynth --database-url "jdbc:sqlserver://db" paginate "SELECT * FROM t" --page 2 --size 10
//!
//! # Show which dialect a connection URL resolves to
//! sqlsynth --database-url "postgres://localhost/app" dialect
//! ```

pub mod batch;
pub mod config;
pub mod connection;
pub mod page;
pub mod sqlite;

pub use sqlsynth_core::{Error, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{run_batches, BatchExecutor};
    pub use crate::config::{ConfigError, ExecutorConfig};
    pub use crate::connection::{BatchConnection, QueryConnection};
    pub use crate::page::fetch_page;
    pub use crate::sqlite::SqliteConnection;
    pub use crate::Error;
}
