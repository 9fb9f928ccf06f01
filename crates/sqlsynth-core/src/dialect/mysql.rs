//! MySQL / MariaDB dialect.

use super::{insert_values, Dialect, DialectKind, MergePlan, PageStrategy};
use crate::scan::ScanOptions;

/// MySQL dialect.
///
/// Upserts use `INSERT … ON DUPLICATE KEY UPDATE`, which resolves the
/// conflict against any unique key, so no conflict target is rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn null_fallback(&self) -> &'static str {
        "IFNULL"
    }

    fn set_clause(&self, _table: &str, column: &str) -> String {
        format!("{column} = VALUES({column})")
    }

    fn set_if_null_clause(&self, _table: &str, column: &str) -> String {
        format!("{column} = IFNULL(VALUES({column}), {column})")
    }

    fn merge_statement(&self, plan: &MergePlan<'_>) -> String {
        if plan.assignments.is_empty() {
            return insert_values(plan.table, &plan.columns).replacen("INSERT", "INSERT IGNORE", 1);
        }
        format!(
            "{} ON DUPLICATE KEY UPDATE {}",
            insert_values(plan.table, &plan.columns),
            plan.assignments.join(", ")
        )
    }

    fn page_strategy(&self) -> PageStrategy {
        PageStrategy::LimitOffset
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            backslash_escapes: true,
        }
    }
}
