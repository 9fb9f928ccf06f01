//! PostgreSQL dialect.

use super::{on_conflict, Dialect, DialectKind, MergePlan, PageStrategy};

/// PostgreSQL dialect.
///
/// Upserts use `INSERT … ON CONFLICT (<keys>) DO UPDATE`, reading incoming
/// values from the `EXCLUDED` pseudo-table.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn set_clause(&self, _table: &str, column: &str) -> String {
        format!("{column} = EXCLUDED.{column}")
    }

    fn set_if_null_clause(&self, table: &str, column: &str) -> String {
        format!("{column} = COALESCE(EXCLUDED.{column}, {table}.{column})")
    }

    fn merge_statement(&self, plan: &MergePlan<'_>) -> String {
        on_conflict(plan)
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::LimitOffset
    }
}
