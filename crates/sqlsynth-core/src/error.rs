//! Error types for statement synthesis, pagination and batch execution.

use thiserror::Error;

/// Boxed error used to carry driver failures without depending on a driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the synthesis engine and its executors.
#[derive(Debug, Error)]
pub enum Error {
    /// The entity has no columns usable for the requested statement.
    #[error("entity `{entity}` has no columns for {operation}")]
    ColumnNotFound {
        /// Table name of the entity.
        entity: String,
        /// The statement being synthesized.
        operation: &'static str,
    },

    /// The statement needs a primary key and the entity declares none.
    #[error("entity `{entity}` has no primary key column, required for {operation}")]
    PrimaryKeyNotFound {
        /// Table name of the entity.
        entity: String,
        /// The statement being synthesized.
        operation: &'static str,
    },

    /// The connection URL or dialect name matches no known dialect.
    #[error("no suitable dialect for `{0}`")]
    NoSuitableDialect(String),

    /// A bound field could not be read from an entity instance.
    #[error("cannot read field `{field}` of entity `{entity}`")]
    DataAccess {
        /// Table name of the entity.
        entity: String,
        /// The field that could not be read.
        field: String,
    },

    /// Executing a statement failed.
    #[error("failed to execute `{statement}`: {source}")]
    SqlExecution {
        /// The statement text that failed.
        statement: String,
        /// The underlying driver error.
        #[source]
        source: BoxError,
    },

    /// The query to paginate has no top-level SELECT.
    #[error("query has no top-level SELECT: {0}")]
    MissingSelect(String),

    /// Page number or page size is out of range.
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),

    /// Batch chunk size is zero.
    #[error("batch chunk size must be at least 1")]
    InvalidChunkSize,
}

impl Error {
    /// Wraps a driver error together with the statement that caused it.
    pub fn execution(statement: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::SqlExecution {
            statement: statement.into(),
            source: source.into(),
        }
    }
}

/// Result type alias for sqlsynth operations.
pub type Result<T> = std::result::Result<T, Error>;
