//! SQL Server dialect.

use super::{merge_using, Dialect, DialectKind, MergePlan, PageStrategy};

/// SQL Server dialect.
///
/// Upserts use `MERGE INTO … USING (SELECT …)`; the statement must be
/// terminated with a semicolon.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn null_fallback(&self) -> &'static str {
        "ISNULL"
    }

    fn uses_merge_join(&self) -> bool {
        true
    }

    fn set_clause(&self, _table: &str, column: &str) -> String {
        format!("X.{column} = Y.{column}")
    }

    fn set_if_null_clause(&self, _table: &str, column: &str) -> String {
        format!("X.{column} = ISNULL(Y.{column}, X.{column})")
    }

    fn merge_statement(&self, plan: &MergePlan<'_>) -> String {
        merge_using(plan, "", ";")
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::OffsetFetch
    }
}
