//! SQLite dialect implementation.

use super::{on_conflict, Dialect, DialectKind, MergePlan, PageStrategy};

/// SQLite dialect.
///
/// Upserts use `ON CONFLICT … DO UPDATE` (SQLite 3.24.0+), reading incoming
/// values from the `excluded` pseudo-table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn set_clause(&self, _table: &str, column: &str) -> String {
        format!("{column} = excluded.{column}")
    }

    fn set_if_null_clause(&self, table: &str, column: &str) -> String {
        format!("{column} = COALESCE(excluded.{column}, {table}.{column})")
    }

    fn merge_statement(&self, plan: &MergePlan<'_>) -> String {
        on_conflict(plan)
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::LimitOffset
    }
}
